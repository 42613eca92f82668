use super::formatter::BlockFormatter;
use super::{should_load_url, Language, LanguageGenerator, SignalSet};
use crate::actions::{Action, ActionInContext, MouseButton};
use crate::options::{OptionValue, ScriptHeader};

/// Node.js `playwright` scripts inside an async IIFE.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaScriptLanguageGenerator;

impl LanguageGenerator for JavaScriptLanguageGenerator {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn generate_header(&self, header: &ScriptHeader) -> String {
        let browser = &header.browser_name;
        let mut f = BlockFormatter::new(0, 2);
        let devices = if header.device.is_some() { ", devices" } else { "" };
        f.add(&format!("const {{ {}{} }} = require('playwright');", browser, devices));
        f.new_line();
        f.add("(async () => {");
        f.add(&format!(
            "const browser = await {}.launch({});",
            browser,
            format_object_or_void(&header.launch.entries())
        ));
        f.add(&format!(
            "const context = await browser.newContext({});",
            format_context_options(&header.context.entries(), header.device.as_deref())
        ));
        f.format()
    }

    fn generate_action(&self, action_in_context: &ActionInContext, performing_action: bool) -> String {
        let ActionInContext {
            page_alias, action, ..
        } = action_in_context;
        let mut f = BlockFormatter::new(2, 2);
        f.new_line();
        f.add(&format!("// {}", action.title()));

        if let Action::OpenPage { url } = action {
            f.add(&format!("const {} = await context.newPage();", page_alias));
            if should_load_url(url) {
                f.add(&format!("await {}.goto({});", page_alias, quote(url)));
            }
            return f.format();
        }

        let subject = subject(action_in_context);
        let signals = SignalSet::collect(&action_in_context.signals);

        if signals.dialog.is_some() {
            f.add(&format!("{}.once('dialog', dialog => {{", page_alias));
            f.add("console.log(`Dialog message: ${dialog.message()}`);");
            f.add("dialog.dismiss().catch(() => {});");
            f.add("});");
        }

        let wait_for_navigation = signals.awaited_navigation(performing_action);
        let assert_navigation = signals.asserted_navigation(performing_action);
        let emit_promise_all =
            wait_for_navigation.is_some() || signals.popup.is_some() || signals.download;

        if emit_promise_all {
            let left_hand_side = if let Some(popup) = signals.popup {
                format!("const [{}] = ", popup)
            } else if signals.download {
                "const [download] = ".to_string()
            } else {
                String::new()
            };
            f.add(&format!("{}await Promise.all([", left_hand_side));
        }
        if signals.popup.is_some() {
            f.add(&format!("{}.waitForEvent('popup'),", page_alias));
        }
        if let Some(url) = wait_for_navigation {
            f.add(&format!(
                "{}.waitForNavigation(/*{{ url: {} }}*/),",
                page_alias,
                quote(url)
            ));
        }
        if signals.download {
            f.add(&format!("{}.waitForEvent('download'),", page_alias));
        }

        let call = action_call(action);
        if emit_promise_all {
            f.add(&format!("{}.{}", subject, call));
            f.add("]);");
        } else {
            f.add(&format!("await {}.{};", subject, call));
        }

        if let Some(url) = assert_navigation {
            f.add(&format!("// assert.equal({}.url(), {});", page_alias, quote(url)));
        }
        f.format()
    }

    fn generate_footer(&self) -> String {
        [
            "  // ---------------------",
            "  await context.close();",
            "  await browser.close();",
            "})();",
        ]
        .join("\n")
    }
}

fn subject(action_in_context: &ActionInContext) -> String {
    let frame = &action_in_context.frame;
    if frame.is_main {
        return action_in_context.page_alias.clone();
    }
    match &frame.name {
        Some(name) => format!("{}.frame({{ name: {} }})", action_in_context.page_alias, quote(name)),
        None => format!("{}.frame({{ url: {} }})", action_in_context.page_alias, quote(&frame.url)),
    }
}

fn action_call(action: &Action) -> String {
    match action {
        // Rendered by the caller.
        Action::OpenPage { .. } => String::new(),
        Action::ClosePage => "close()".to_string(),
        Action::Click {
            selector,
            button,
            modifiers,
            click_count,
        } => {
            let method = if *click_count == 2 { "dblclick" } else { "click" };
            let mut options = Vec::new();
            if *button != MouseButton::Left {
                options.push(("button", OptionValue::Str(button.as_str().to_string())));
            }
            if !modifiers.is_empty() {
                options.push((
                    "modifiers",
                    OptionValue::List(
                        modifiers
                            .key_names()
                            .into_iter()
                            .map(|name| OptionValue::Str(name.to_string()))
                            .collect(),
                    ),
                ));
            }
            if *click_count > 2 {
                options.push(("clickCount", OptionValue::Int(*click_count as i64)));
            }
            let options = if options.is_empty() {
                String::new()
            } else {
                format!(", {}", format_entries(&options))
            };
            format!("{}({}{})", method, quote(selector), options)
        }
        Action::Check { selector } => format!("check({})", quote(selector)),
        Action::Uncheck { selector } => format!("uncheck({})", quote(selector)),
        Action::Fill { selector, text } => format!("fill({}, {})", quote(selector), quote(text)),
        Action::SetInputFiles { selector, files } => {
            format!("setInputFiles({}, {})", quote(selector), one_or_many(files))
        }
        Action::Press {
            selector,
            key,
            modifiers,
        } => {
            let mut shortcut: Vec<&str> = modifiers.key_names();
            shortcut.push(key.as_str());
            format!("press({}, {})", quote(selector), quote(&shortcut.join("+")))
        }
        Action::Navigate { url } => format!("goto({})", quote(url)),
        Action::Select { selector, options } => {
            format!("selectOption({}, {})", quote(selector), one_or_many(options))
        }
    }
}

fn one_or_many(values: &[String]) -> String {
    match values {
        [single] => quote(single),
        many => format!(
            "[{}]",
            many.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn format_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Int(n) => n.to_string(),
        OptionValue::Float(n) => OptionValue::format_number(*n),
        OptionValue::Str(s) => quote(s),
        OptionValue::List(items) => format!(
            "[{}]",
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        ),
        OptionValue::Object(entries) => format_entries(entries),
    }
}

fn format_entries(entries: &[(&'static str, OptionValue)]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let tokens: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("  {}: {}", key, format_value(value)))
        .collect();
    format!("{{\n{}\n}}", tokens.join(",\n"))
}

fn format_object_or_void(entries: &[(&'static str, OptionValue)]) -> String {
    if entries.is_empty() {
        String::new()
    } else {
        format_entries(entries)
    }
}

fn format_context_options(entries: &[(&'static str, OptionValue)], device: Option<&str>) -> String {
    let Some(device) = device else {
        return format_object_or_void(entries);
    };
    let serialized = if entries.is_empty() {
        "{\n}".to_string()
    } else {
        format_entries(entries)
    };
    let mut lines: Vec<String> = serialized.split('\n').map(str::to_string).collect();
    lines.insert(1, format!("...devices[{}],", quote(device)));
    lines.join("\n")
}

fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{FrameRef, Modifiers, NavigationKind, Signal};
    use crate::options::{ColorScheme, ContextOptions};

    fn on_page(action: Action) -> ActionInContext {
        ActionInContext::new("page", FrameRef::main("https://example.com/"), action)
    }

    #[test]
    fn header_without_options() {
        let mut header = ScriptHeader::new("chromium");
        header.launch.headless = Some(false);
        assert_eq!(
            JavaScriptLanguageGenerator.generate_header(&header),
            "const { chromium } = require('playwright');\n\
             \n\
             (async () => {\n  \
             const browser = await chromium.launch({\n    \
             headless: false\n  \
             });\n  \
             const context = await browser.newContext();"
        );
    }

    #[test]
    fn header_spreads_device_before_options() {
        let header = ScriptHeader {
            device: Some("Pixel 2".into()),
            context: ContextOptions {
                color_scheme: Some(ColorScheme::Light),
                ..Default::default()
            },
            ..ScriptHeader::new("chromium")
        };
        let text = JavaScriptLanguageGenerator.generate_header(&header);
        assert!(text.starts_with("const { chromium, devices } = require('playwright');"));
        assert!(text.ends_with(
            "  const context = await browser.newContext({\n    \
             ...devices['Pixel 2'],\n    \
             colorScheme: 'light'\n  \
             });"
        ));
    }

    #[test]
    fn click_with_options() {
        let action = on_page(Action::Click {
            selector: "#b".into(),
            button: MouseButton::Right,
            modifiers: Modifiers::SHIFT,
            click_count: 1,
        });
        assert_eq!(
            JavaScriptLanguageGenerator.generate_action(&action, true),
            "\n  // Click #b\n  \
             await page.click('#b', {\n    \
             button: 'right',\n    \
             modifiers: ['Shift']\n  \
             });"
        );
    }

    #[test]
    fn press_joins_modifiers_into_shortcut() {
        let action = on_page(Action::Press {
            selector: "input[name=\"name\"]".into(),
            key: "Enter".into(),
            modifiers: Modifiers::SHIFT,
        });
        assert_eq!(
            JavaScriptLanguageGenerator.generate_action(&action, true),
            "\n  // Press Enter with modifiers\n  await page.press('input[name=\"name\"]', 'Shift+Enter');"
        );
    }

    #[test]
    fn asserted_navigation_follows_call() {
        let action = on_page(Action::Click {
            selector: "text=\"link\"".into(),
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            click_count: 1,
        })
        .with_signal(Signal::Navigation {
            url: "https://example.com/next".into(),
            kind: NavigationKind::Assert,
        });
        assert_eq!(
            JavaScriptLanguageGenerator.generate_action(&action, true),
            "\n  // Click text=\"link\"\n  \
             await page.click('text=\"link\"');\n  \
             // assert.equal(page.url(), 'https://example.com/next');"
        );
    }

    #[test]
    fn child_frames_use_frame_lookup() {
        let action = ActionInContext::new(
            "page",
            FrameRef::child("https://example.com/inner", Some("inner".into())),
            Action::Check {
                selector: "#c".into(),
            },
        );
        assert_eq!(
            JavaScriptLanguageGenerator.generate_action(&action, true),
            "\n  // Check #c\n  await page.frame({ name: 'inner' }).check('#c');"
        );
    }

    #[test]
    fn quotes_escape_backslashes_first() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
    }
}
