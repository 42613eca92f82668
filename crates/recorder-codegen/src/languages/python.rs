use super::formatter::PythonFormatter;
use super::{should_load_url, Language, LanguageGenerator, SignalSet};
use crate::actions::{Action, ActionInContext, MouseButton};
use crate::options::{OptionValue, ScriptHeader};

/// Python scripts, sync or asyncio flavoured.
#[derive(Debug, Clone, Copy)]
pub struct PythonLanguageGenerator {
    is_async: bool,
}

impl PythonLanguageGenerator {
    pub fn sync() -> Self {
        Self { is_async: false }
    }

    pub fn asynchronous() -> Self {
        Self { is_async: true }
    }

    fn await_prefix(&self) -> &'static str {
        if self.is_async {
            "await "
        } else {
            ""
        }
    }

    fn with_keyword(&self) -> &'static str {
        if self.is_async {
            "async with"
        } else {
            "with"
        }
    }
}

impl LanguageGenerator for PythonLanguageGenerator {
    fn language(&self) -> Language {
        if self.is_async {
            Language::PythonAsync
        } else {
            Language::Python
        }
    }

    fn generate_header(&self, header: &ScriptHeader) -> String {
        let aw = self.await_prefix();
        let mut f = PythonFormatter::new(0);
        if self.is_async {
            f.add(0, "import asyncio");
            f.add(0, "from playwright import async_playwright");
            f.new_line();
            f.add(0, "async def run(playwright):");
        } else {
            f.add(0, "from playwright import sync_playwright");
            f.new_line();
            f.add(0, "def run(playwright):");
        }

        let launch_args = format_args(&header.launch.entries());
        f.add(
            1,
            format!(
                "browser = {}playwright.{}.launch({})",
                aw, header.browser_name, launch_args
            ),
        );

        let mut context_args = Vec::new();
        if let Some(device) = &header.device {
            context_args.push(format!("**playwright.devices[{}]", quote(device)));
        }
        let options = format_args(&header.context.entries());
        if !options.is_empty() {
            context_args.push(options);
        }
        f.add(
            1,
            format!("context = {}browser.newContext({})", aw, context_args.join(", ")),
        );
        f.format()
    }

    fn generate_action(&self, action_in_context: &ActionInContext, performing_action: bool) -> String {
        let ActionInContext {
            page_alias, action, ..
        } = action_in_context;
        let aw = self.await_prefix();
        let with = self.with_keyword();
        let mut f = PythonFormatter::new(4);
        f.new_line();
        f.add(0, format!("# {}", action.title()));

        if let Action::OpenPage { url } = action {
            f.add(0, format!("{} = {}context.newPage()", page_alias, aw));
            if should_load_url(url) {
                f.add(0, format!("{}{}.goto({})", aw, page_alias, quote(url)));
            }
            return f.format();
        }

        let subject = subject(action_in_context);
        let signals = SignalSet::collect(&action_in_context.signals);

        if signals.dialog.is_some() {
            let handler = if self.is_async {
                "lambda dialog: asyncio.create_task(dialog.dismiss())"
            } else {
                "lambda dialog: dialog.dismiss()"
            };
            f.add(0, format!("{}.once(\"dialog\", {})", page_alias, handler));
        }

        let mut level = 0;
        if signals.popup.is_some() {
            f.add(
                level,
                format!("{} {}.expect_popup() as popup_info:", with, page_alias),
            );
            level += 1;
        }
        if signals.download {
            f.add(
                level,
                format!("{} {}.expect_download() as download_info:", with, page_alias),
            );
            level += 1;
        }
        if let Some(url) = signals.awaited_navigation(performing_action) {
            f.add(
                level,
                format!("# {} {}.expect_navigation(url={}):", with, page_alias, quote(url)),
            );
            f.add(level, format!("{} {}.expect_navigation():", with, page_alias));
            level += 1;
        }

        f.add(level, format!("{}{}.{}", aw, subject, action_call(action)));

        if let Some(popup) = signals.popup {
            f.add(0, format!("{} = {}popup_info.value", popup, aw));
        }
        if signals.download {
            f.add(0, format!("download = {}download_info.value", aw));
        }
        if let Some(url) = signals.asserted_navigation(performing_action) {
            f.add(0, format!("# assert {}.url == {}", page_alias, quote(url)));
        }
        f.format()
    }

    fn generate_footer(&self) -> String {
        if self.is_async {
            [
                "    # ---------------------",
                "    await context.close()",
                "    await browser.close()",
                "",
                "async def main():",
                "    async with async_playwright() as playwright:",
                "        await run(playwright)",
                "asyncio.run(main())",
            ]
            .join("\n")
        } else {
            [
                "    # ---------------------",
                "    context.close()",
                "    browser.close()",
                "",
                "with sync_playwright() as playwright:",
                "    run(playwright)",
            ]
            .join("\n")
        }
    }
}

fn subject(action_in_context: &ActionInContext) -> String {
    let frame = &action_in_context.frame;
    if frame.is_main {
        return action_in_context.page_alias.clone();
    }
    match &frame.name {
        Some(name) => format!("{}.frame(name={})", action_in_context.page_alias, quote(name)),
        None => format!("{}.frame(url={})", action_in_context.page_alias, quote(&frame.url)),
    }
}

fn action_call(action: &Action) -> String {
    match action {
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
            let options = format_args(&options);
            if options.is_empty() {
                format!("{}({})", method, quote(selector))
            } else {
                format!("{}({}, {})", method, quote(selector), options)
            }
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

fn format_args(entries: &[(&'static str, OptionValue)]) -> String {
    entries
        .iter()
        .map(|(key, value)| format!("{}={}", key, format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(true) => "True".to_string(),
        OptionValue::Bool(false) => "False".to_string(),
        OptionValue::Int(n) => n.to_string(),
        OptionValue::Float(n) => OptionValue::format_number(*n),
        OptionValue::Str(s) => quote(s),
        OptionValue::List(items) => format!(
            "[{}]",
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        ),
        OptionValue::Object(entries) => format!(
            "{{{}}}",
            entries
                .iter()
                .map(|(key, value)| format!("{}: {}", quote(key), format_value(value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}
