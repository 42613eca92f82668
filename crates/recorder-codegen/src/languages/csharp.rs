use super::formatter::BlockFormatter;
use super::{should_load_url, to_pascal, Language, LanguageGenerator, SignalSet};
use crate::actions::{Action, ActionInContext, MouseButton};
use crate::options::{OptionValue, ScriptHeader};

/// .NET top-level statements against the async C# bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct CSharpLanguageGenerator;

impl LanguageGenerator for CSharpLanguageGenerator {
    fn language(&self) -> Language {
        Language::Csharp
    }

    fn generate_header(&self, header: &ScriptHeader) -> String {
        let mut f = BlockFormatter::new(0, 4);
        f.add("await Playwright.InstallAsync();");
        f.add("using var playwright = await Playwright.CreateAsync();");
        f.add(&format!(
            "await using var browser = await playwright.{}.LaunchAsync({});",
            to_pascal(&header.browser_name),
            format_named_args(&header.launch.entries())
        ));
        f.add(&format!(
            "var context = await browser.NewContextAsync({});",
            format_context_options(&header.context.entries(), header.device.as_deref())
        ));
        f.format()
    }

    fn generate_action(&self, action_in_context: &ActionInContext, performing_action: bool) -> String {
        let ActionInContext {
            page_alias, action, ..
        } = action_in_context;
        let mut f = BlockFormatter::new(0, 4).with_paren_blocks();
        f.new_line();
        f.add(&format!("// {}", action.title()));

        if let Action::OpenPage { url } = action {
            f.add(&format!("var {} = await context.NewPageAsync();", page_alias));
            if should_load_url(url) {
                f.add(&format!("await {}.GoToAsync({});", page_alias, quote(url)));
            }
            return f.format();
        }

        let subject = subject(action_in_context);
        let signals = SignalSet::collect(&action_in_context.signals);

        if let Some(dialog) = signals.dialog {
            let handler = format!("{}_Dialog{}_EventHandler", page_alias, dialog);
            f.add(&format!("void {}(object sender, DialogEventArgs e)", handler));
            f.add("{");
            f.add("Console.WriteLine($\"Dialog message: {e.Dialog.Message}\");");
            f.add("e.Dialog.DismissAsync();");
            f.add(&format!("{}.Dialog -= {};", page_alias, handler));
            f.add("}");
            f.add(&format!("{}.Dialog += {};", page_alias, handler));
        }

        let wait_for_navigation = signals.awaited_navigation(performing_action);
        let assert_navigation = signals.asserted_navigation(performing_action);
        let emit_task_when_all =
            wait_for_navigation.is_some() || signals.popup.is_some() || signals.download;

        if let Some(popup) = signals.popup {
            f.add(&format!(
                "var {}Task = {}.WaitForEventAsync(PageEvent.Popup);",
                popup, page_alias
            ));
        }
        if signals.download {
            f.add(&format!(
                "var downloadTask = {}.WaitForEventAsync(PageEvent.Download);",
                page_alias
            ));
        }

        let call = action_call(action);
        if emit_task_when_all {
            f.add("await Task.WhenAll(");
            if let Some(popup) = signals.popup {
                f.add(&format!("{}Task,", popup));
            }
            if let Some(url) = wait_for_navigation {
                f.add(&format!(
                    "{}.WaitForNavigationAsync(/*{}*/),",
                    page_alias,
                    quote(url)
                ));
            }
            if signals.download {
                f.add("downloadTask,");
            }
            f.add(&format!("{}.{});", subject, call));
        } else {
            f.add(&format!("await {}.{};", subject, call));
        }

        if let Some(url) = assert_navigation {
            f.add(&format!("// Assert.Equal({}, {}.Url);", quote(url), page_alias));
        }
        f.format()
    }

    fn generate_footer(&self) -> String {
        ["// ---------------------", "await context.CloseAsync();"].join("\n")
    }
}

fn subject(action_in_context: &ActionInContext) -> String {
    let frame = &action_in_context.frame;
    if frame.is_main {
        return action_in_context.page_alias.clone();
    }
    match &frame.name {
        Some(name) => format!("{}.GetFrame(name: {})", action_in_context.page_alias, quote(name)),
        None => format!("{}.GetFrame(url: {})", action_in_context.page_alias, quote(&frame.url)),
    }
}

fn action_call(action: &Action) -> String {
    match action {
        Action::OpenPage { .. } => String::new(),
        Action::ClosePage => "CloseAsync()".to_string(),
        Action::Click {
            selector,
            button,
            modifiers,
            click_count,
        } => {
            let method = if *click_count == 2 {
                "DblClickAsync"
            } else {
                "ClickAsync"
            };
            let mut args = vec![quote(selector)];
            if *button != MouseButton::Left {
                args.push(format!("button: MouseButton.{}", to_pascal(button.as_str())));
            }
            if !modifiers.is_empty() {
                let names: Vec<String> = modifiers
                    .key_names()
                    .into_iter()
                    .map(|name| format!("Modifier.{}", name))
                    .collect();
                args.push(format!("modifiers: new[] {{ {} }}", names.join(", ")));
            }
            if *click_count > 2 {
                args.push(format!("clickCount: {}", click_count));
            }
            format!("{}({})", method, args.join(", "))
        }
        Action::Check { selector } => format!("CheckAsync({})", quote(selector)),
        Action::Uncheck { selector } => format!("UncheckAsync({})", quote(selector)),
        Action::Fill { selector, text } => {
            format!("FillAsync({}, {})", quote(selector), quote(text))
        }
        Action::SetInputFiles { selector, files } => {
            format!("SetInputFilesAsync({}, {})", quote(selector), one_or_many(files))
        }
        Action::Press {
            selector,
            key,
            modifiers,
        } => {
            let mut shortcut: Vec<&str> = modifiers.key_names();
            shortcut.push(key.as_str());
            format!("PressAsync({}, {})", quote(selector), quote(&shortcut.join("+")))
        }
        Action::Navigate { url } => format!("GoToAsync({})", quote(url)),
        Action::Select { selector, options } => {
            format!("SelectOptionAsync({}, {})", quote(selector), one_or_many(options))
        }
    }
}

fn one_or_many(values: &[String]) -> String {
    match values {
        [] => "new string[] { }".to_string(),
        [single] => quote(single),
        many => format!(
            "new[] {{ {} }}",
            many.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn format_named_args(entries: &[(&'static str, OptionValue)]) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{}: {}", key, format_value(key, value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_context_options(entries: &[(&'static str, OptionValue)], device: Option<&str>) -> String {
    let Some(device) = device else {
        return format_named_args(entries);
    };
    let device = format!("playwright.Devices[{}]", quote(device));
    if entries.is_empty() {
        return device;
    }
    let initializers: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{} = {}", to_pascal(key), format_value(key, value)))
        .collect();
    format!(
        "new BrowserContextOptions({}) {{ {} }}",
        device,
        initializers.join(", ")
    )
}

/// Option values map onto the binding's enums and option classes.
fn format_value(key: &str, value: &OptionValue) -> String {
    match (key, value) {
        ("colorScheme", OptionValue::Str(scheme)) => format!("ColorScheme.{}", to_pascal(scheme)),
        ("permissions", OptionValue::List(items)) => {
            let names: Vec<String> = items
                .iter()
                .map(|item| match item {
                    OptionValue::Str(name) => format!("ContextPermission.{}", to_pascal(name)),
                    other => format_value("", other),
                })
                .collect();
            format!("new[] {{ {} }}", names.join(", "))
        }
        ("viewport", OptionValue::Object(fields)) => {
            format!("new ViewportSize {{ {} }}", format_initializers(fields))
        }
        ("geolocation", OptionValue::Object(fields)) => {
            format!("new Geolocation {{ {} }}", format_initializers(fields))
        }
        (_, OptionValue::Bool(b)) => b.to_string(),
        (_, OptionValue::Int(n)) => n.to_string(),
        (_, OptionValue::Float(n)) => format!("{}m", OptionValue::format_number(*n)),
        (_, OptionValue::Str(s)) => quote(s),
        (_, OptionValue::List(items)) => format!(
            "new[] {{ {} }}",
            items
                .iter()
                .map(|item| format_value("", item))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        (_, OptionValue::Object(fields)) => format!("new {{ {} }}", format_initializers(fields)),
    }
}

fn format_initializers(fields: &[(&'static str, OptionValue)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{} = {}", to_pascal(key), format_value(key, value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{FrameRef, Modifiers, NavigationKind, Signal};
    use crate::options::{ColorScheme, ContextOptions, Geolocation, Viewport};

    fn click(selector: &str) -> Action {
        Action::Click {
            selector: selector.into(),
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            click_count: 1,
        }
    }

    fn on_page(action: Action) -> ActionInContext {
        ActionInContext::new("page", FrameRef::main("https://example.com/"), action)
    }

    #[test]
    fn header_uses_named_arguments() {
        let mut header = ScriptHeader::new("chromium");
        header.launch.headless = Some(false);
        header.context = ContextOptions {
            color_scheme: Some(ColorScheme::Dark),
            viewport: Some(Viewport {
                width: 1280,
                height: 720,
            }),
            ..Default::default()
        };
        assert_eq!(
            CSharpLanguageGenerator.generate_header(&header),
            "await Playwright.InstallAsync();\n\
             using var playwright = await Playwright.CreateAsync();\n\
             await using var browser = await playwright.Chromium.LaunchAsync(headless: false);\n\
             var context = await browser.NewContextAsync(colorScheme: ColorScheme.Dark, viewport: new ViewportSize { Width = 1280, Height = 720 });"
        );
    }

    #[test]
    fn device_with_options_uses_initializer() {
        let header = ScriptHeader {
            device: Some("Pixel 2".into()),
            context: ContextOptions {
                geolocation: Some(Geolocation {
                    latitude: 1.5,
                    longitude: 2.0,
                }),
                ..Default::default()
            },
            ..ScriptHeader::new("webkit")
        };
        let text = CSharpLanguageGenerator.generate_header(&header);
        assert!(text.ends_with(
            "var context = await browser.NewContextAsync(new BrowserContextOptions(playwright.Devices[\"Pixel 2\"]) { Geolocation = new Geolocation { Latitude = 1.5m, Longitude = 2m } });"
        ));
        assert!(text.contains("playwright.Webkit.LaunchAsync()"));
    }

    #[test]
    fn popup_waits_with_task_when_all() {
        let action = on_page(click("text=\"open\"")).with_signal(Signal::Popup {
            popup_alias: "popup1".into(),
        });
        assert_eq!(
            CSharpLanguageGenerator.generate_action(&action, true),
            "\n// Click text=\"open\"\n\
             var popup1Task = page.WaitForEventAsync(PageEvent.Popup);\n\
             await Task.WhenAll(\n    \
             popup1Task,\n    \
             page.ClickAsync(\"text=\\\"open\\\"\"));"
        );
    }

    #[test]
    fn awaited_navigation_is_commented_url() {
        let action = on_page(click("#go")).with_signal(Signal::Navigation {
            url: "https://example.com/next".into(),
            kind: NavigationKind::Await,
        });
        assert_eq!(
            CSharpLanguageGenerator.generate_action(&action, false),
            "\n// Click #go\n\
             await Task.WhenAll(\n    \
             page.WaitForNavigationAsync(/*\"https://example.com/next\"*/),\n    \
             page.ClickAsync(\"#go\"));"
        );
    }

    #[test]
    fn dialog_handler_unsubscribes_itself() {
        let action = on_page(click("#alert")).with_signal(Signal::Dialog {
            dialog_alias: "1".into(),
        });
        let text = CSharpLanguageGenerator.generate_action(&action, true);
        assert!(text.contains(
            "void page_Dialog1_EventHandler(object sender, DialogEventArgs e)\n{\n    \
             Console.WriteLine($\"Dialog message: {e.Dialog.Message}\");\n    \
             e.Dialog.DismissAsync();\n    \
             page.Dialog -= page_Dialog1_EventHandler;\n}\n\
             page.Dialog += page_Dialog1_EventHandler;"
        ));
        assert!(text.ends_with("await page.ClickAsync(\"#alert\");"));
    }

    #[test]
    fn uploads_of_several_files_use_array() {
        let action = on_page(Action::SetInputFiles {
            selector: "input[type=\"file\"]".into(),
            files: vec!["a.txt".into(), "b.txt".into()],
        });
        assert!(CSharpLanguageGenerator
            .generate_action(&action, true)
            .ends_with("await page.SetInputFilesAsync(\"input[type=\\\"file\\\"]\", new[] { \"a.txt\", \"b.txt\" });"));
    }
}
