//! Browser-facing ports
//!
//! The recorder never drives a browser directly. Performed actions go
//! through [`BrowserPort`]; an engine adapter implements it for live
//! sessions and [`DryRunBrowser`] stands in for offline replay.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use recorder_codegen::{Action, FrameRef, Modifiers, MouseButton};
use soulbrowser_core_types::SoulError;
use tracing::debug;

/// Names of the functions page content calls back into.
pub const BINDINGS: [&str; 3] = [
    "performPlaywrightAction",
    "recordPlaywrightAction",
    "commitLastAction",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickOptions {
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub click_count: u32,
}

#[async_trait]
pub trait BrowserPort: Send + Sync {
    async fn expose_binding(&self, name: &str) -> Result<(), SoulError>;

    async fn click(&self, frame: &FrameRef, selector: &str, options: ClickOptions) -> Result<(), SoulError>;

    /// `shortcut` is `Modifier+...+Key`
    async fn press(&self, frame: &FrameRef, selector: &str, shortcut: &str) -> Result<(), SoulError>;

    async fn check(&self, frame: &FrameRef, selector: &str) -> Result<(), SoulError>;

    async fn uncheck(&self, frame: &FrameRef, selector: &str) -> Result<(), SoulError>;

    async fn select_option(&self, frame: &FrameRef, selector: &str, values: &[String]) -> Result<(), SoulError>;
}

/// Runs the browser call that backs a performed action. Actions without a
/// browser counterpart succeed immediately.
pub async fn perform(browser: &dyn BrowserPort, frame: &FrameRef, action: &Action) -> Result<(), SoulError> {
    match action {
        Action::Click {
            selector,
            button,
            modifiers,
            click_count,
        } => {
            let options = ClickOptions {
                button: *button,
                modifiers: *modifiers,
                click_count: *click_count,
            };
            browser.click(frame, selector, options).await
        }
        Action::Press {
            selector,
            key,
            modifiers,
        } => {
            let mut shortcut: Vec<&str> = modifiers.key_names();
            shortcut.push(key);
            browser.press(frame, selector, &shortcut.join("+")).await
        }
        Action::Check { selector } => browser.check(frame, selector).await,
        Action::Uncheck { selector } => browser.uncheck(frame, selector).await,
        Action::Select { selector, options } => browser.select_option(frame, selector, options).await,
        _ => Ok(()),
    }
}

/// Browser port that only records the calls it receives.
///
/// Selectors listed through [`DryRunBrowser::fail_selector`] fail with a
/// detached error, which is how a stale target looks to the recorder.
#[derive(Clone, Default)]
pub struct DryRunBrowser {
    calls: Arc<Mutex<Vec<String>>>,
    failing_selectors: Arc<Mutex<HashSet<String>>>,
    failing_bindings: Arc<Mutex<HashSet<String>>>,
}

impl DryRunBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_selector(&self, selector: impl Into<String>) {
        self.failing_selectors.lock().insert(selector.into());
    }

    pub fn fail_binding(&self, name: impl Into<String>) {
        self.failing_bindings.lock().insert(name.into());
    }

    /// Calls in arrival order, rendered as `method(selector, args)`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String, selector: &str) -> Result<(), SoulError> {
        debug!(%call, "dry-run browser call");
        self.calls.lock().push(call);
        if self.failing_selectors.lock().contains(selector) {
            return Err(SoulError::detached(selector));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserPort for DryRunBrowser {
    async fn expose_binding(&self, name: &str) -> Result<(), SoulError> {
        self.calls.lock().push(format!("exposeBinding({})", name));
        if self.failing_bindings.lock().contains(name) {
            return Err(SoulError::new(format!("binding {} already registered", name)));
        }
        Ok(())
    }

    async fn click(&self, _frame: &FrameRef, selector: &str, options: ClickOptions) -> Result<(), SoulError> {
        self.record(
            format!(
                "click({}, {}, {})",
                selector,
                options.button.as_str(),
                options.click_count
            ),
            selector,
        )
    }

    async fn press(&self, _frame: &FrameRef, selector: &str, shortcut: &str) -> Result<(), SoulError> {
        self.record(format!("press({}, {})", selector, shortcut), selector)
    }

    async fn check(&self, _frame: &FrameRef, selector: &str) -> Result<(), SoulError> {
        self.record(format!("check({})", selector), selector)
    }

    async fn uncheck(&self, _frame: &FrameRef, selector: &str) -> Result<(), SoulError> {
        self.record(format!("uncheck({})", selector), selector)
    }

    async fn select_option(&self, _frame: &FrameRef, selector: &str, values: &[String]) -> Result<(), SoulError> {
        self.record(
            format!("selectOption({}, [{}])", selector, values.join(", ")),
            selector,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn press_builds_shortcut_from_modifiers() {
        let browser = DryRunBrowser::new();
        let action = Action::Press {
            selector: "#q".into(),
            key: "Enter".into(),
            modifiers: Modifiers::CONTROL | Modifiers::SHIFT,
        };
        perform(&browser, &FrameRef::default(), &action).await.unwrap();
        assert_eq!(browser.calls(), vec!["press(#q, Control+Shift+Enter)"]);
    }

    #[tokio::test]
    async fn recorded_only_actions_skip_the_browser() {
        let browser = DryRunBrowser::new();
        let fill = Action::Fill {
            selector: "#q".into(),
            text: "x".into(),
        };
        perform(&browser, &FrameRef::default(), &fill).await.unwrap();
        assert!(browser.calls().is_empty());
    }

    #[tokio::test]
    async fn failing_selector_reports_detached() {
        let browser = DryRunBrowser::new();
        browser.fail_selector("#gone");
        let err = perform(&browser, &FrameRef::default(), &Action::Check { selector: "#gone".into() })
            .await
            .unwrap_err();
        assert!(err.is_detached());
        assert_eq!(browser.calls(), vec!["check(#gone)"]);
    }
}
