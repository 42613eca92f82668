//! Recorded action model.
//!
//! Actions arrive from page content as `name`-tagged JSON objects and are
//! decoded into a closed [`Action`] sum type. Context (page alias, frame,
//! signals, commit state) lives on [`ActionInContext`].

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use soulbrowser_core_types::{ActionId, FrameId};

bitflags! {
    /// Keyboard modifiers held during a click or key press.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const ALT = 1;
        const CONTROL = 2;
        const META = 4;
        const SHIFT = 8;
    }
}

impl Modifiers {
    /// Key names in shortcut order
    pub fn key_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Modifiers::ALT) {
            names.push("Alt");
        }
        if self.contains(Modifiers::CONTROL) {
            names.push("Control");
        }
        if self.contains(Modifiers::META) {
            names.push("Meta");
        }
        if self.contains(Modifiers::SHIFT) {
            names.push("Shift");
        }
        names
    }
}

// Page content sends the raw bitmask.
impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(Modifiers::from_bits_truncate(bits))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
        }
    }
}

fn one() -> u32 {
    1
}

/// One replayable interaction step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Action {
    OpenPage {
        #[serde(default)]
        url: String,
    },
    ClosePage,
    Click {
        selector: String,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(rename = "clickCount", default = "one")]
        click_count: u32,
    },
    Check {
        selector: String,
    },
    Uncheck {
        selector: String,
    },
    Fill {
        selector: String,
        text: String,
    },
    Press {
        selector: String,
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Select {
        selector: String,
        options: Vec<String>,
    },
    SetInputFiles {
        selector: String,
        files: Vec<String>,
    },
    Navigate {
        url: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::OpenPage { .. } => "openPage",
            Action::ClosePage => "closePage",
            Action::Click { .. } => "click",
            Action::Check { .. } => "check",
            Action::Uncheck { .. } => "uncheck",
            Action::Fill { .. } => "fill",
            Action::Press { .. } => "press",
            Action::Select { .. } => "select",
            Action::SetInputFiles { .. } => "setInputFiles",
            Action::Navigate { .. } => "navigate",
        }
    }

    pub fn selector(&self) -> Option<&str> {
        match self {
            Action::Click { selector, .. }
            | Action::Check { selector }
            | Action::Uncheck { selector }
            | Action::Fill { selector, .. }
            | Action::Press { selector, .. }
            | Action::Select { selector, .. }
            | Action::SetInputFiles { selector, .. } => Some(selector),
            Action::OpenPage { .. } | Action::ClosePage | Action::Navigate { .. } => None,
        }
    }

    /// Human-readable title used for the comment above each statement.
    pub fn title(&self) -> String {
        match self {
            Action::OpenPage { .. } => "Open new page".to_string(),
            Action::ClosePage => "Close page".to_string(),
            Action::Check { selector } => format!("Check {}", selector),
            Action::Uncheck { selector } => format!("Uncheck {}", selector),
            Action::Click {
                selector,
                click_count,
                ..
            } => match click_count {
                1 => format!("Click {}", selector),
                2 => format!("Double click {}", selector),
                3 => format!("Triple click {}", selector),
                n => format!("{}× click {}", n, selector),
            },
            Action::Fill { selector, .. } => format!("Fill {}", selector),
            Action::SetInputFiles { files, .. } if files.is_empty() => {
                "Clear selected files".to_string()
            }
            Action::SetInputFiles { files, .. } => format!("Upload {}", files.join(", ")),
            Action::Navigate { url } => format!("Go to {}", url),
            Action::Press { key, modifiers, .. } if modifiers.is_empty() => {
                format!("Press {}", key)
            }
            Action::Press { key, .. } => format!("Press {} with modifiers", key),
            Action::Select { selector, .. } => format!("Select {}", selector),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    /// Replay must wait for the navigation the action triggers
    Await,
    /// Navigation already happened while the action ran
    Assert,
}

/// Out-of-band side effect correlated to an action after the fact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Signal {
    Navigation {
        url: String,
        #[serde(rename = "type")]
        kind: NavigationKind,
    },
    Popup {
        #[serde(rename = "popupAlias")]
        popup_alias: String,
    },
    Download,
    Dialog {
        #[serde(rename = "dialogAlias", default)]
        dialog_alias: String,
    },
}

/// Frame an action originated from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    #[serde(default)]
    pub id: FrameId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "isMain", default = "main_frame_default")]
    pub is_main: bool,
}

fn main_frame_default() -> bool {
    true
}

impl FrameRef {
    pub fn main(url: impl Into<String>) -> Self {
        Self {
            id: FrameId::new(),
            url: url.into(),
            name: None,
            is_main: true,
        }
    }

    pub fn child(url: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: FrameId::new(),
            url: url.into(),
            name: name.filter(|n| !n.is_empty()),
            is_main: false,
        }
    }
}

impl Default for FrameRef {
    fn default() -> Self {
        FrameRef::main("")
    }
}

/// An action plus everything needed to render it.
///
/// Values are replaced, never shared: attaching a signal yields a new
/// `ActionInContext` with the same id.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionInContext {
    pub id: ActionId,
    pub page_alias: String,
    pub frame: FrameRef,
    pub action: Action,
    pub signals: Vec<Signal>,
    committed: bool,
}

impl ActionInContext {
    pub fn new(page_alias: impl Into<String>, frame: FrameRef, action: Action) -> Self {
        Self {
            id: ActionId::new(),
            page_alias: page_alias.into(),
            frame,
            action,
            signals: Vec::new(),
            committed: false,
        }
    }

    pub fn with_id(mut self, id: ActionId) -> Self {
        self.id = id;
        self
    }

    pub fn into_committed(mut self) -> Self {
        self.committed = true;
        self
    }

    /// Copy of this action with `signal` appended.
    pub fn with_signal(&self, signal: Signal) -> Self {
        let mut next = self.clone();
        next.signals.push(signal);
        next
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Monotonic: there is no way back to uncommitted.
    pub fn commit(&mut self) {
        self.committed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_page_payloads() {
        let click: Action = serde_json::from_value(json!({
            "name": "click",
            "selector": "text=\"Submit\"",
            "signals": [],
            "button": "left",
            "modifiers": 8,
            "clickCount": 2
        }))
        .unwrap();
        assert_eq!(
            click,
            Action::Click {
                selector: "text=\"Submit\"".into(),
                button: MouseButton::Left,
                modifiers: Modifiers::SHIFT,
                click_count: 2,
            }
        );

        let files: Action = serde_json::from_value(json!({
            "name": "setInputFiles",
            "selector": "input[type=\"file\"]",
            "files": ["a.txt"]
        }))
        .unwrap();
        assert_eq!(files.name(), "setInputFiles");
        assert_eq!(files.title(), "Upload a.txt");
    }

    #[test]
    fn titles_follow_click_count() {
        let click = |count| Action::Click {
            selector: "#b".into(),
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            click_count: count,
        };
        assert_eq!(click(1).title(), "Click #b");
        assert_eq!(click(2).title(), "Double click #b");
        assert_eq!(click(3).title(), "Triple click #b");
        assert_eq!(click(4).title(), "4× click #b");
    }

    #[test]
    fn press_title_mentions_modifiers() {
        let press = Action::Press {
            selector: "input".into(),
            key: "Enter".into(),
            modifiers: Modifiers::SHIFT | Modifiers::CONTROL,
        };
        assert_eq!(press.title(), "Press Enter with modifiers");
        assert_eq!(
            (Modifiers::SHIFT | Modifiers::CONTROL).key_names(),
            vec!["Control", "Shift"]
        );
    }

    #[test]
    fn commit_is_sticky_across_signals() {
        let mut action = ActionInContext::new("page", FrameRef::main("about:blank"), Action::ClosePage);
        action.commit();
        let signalled = action.with_signal(Signal::Download);
        assert!(signalled.is_committed());
        assert_eq!(signalled.id, action.id);
        assert_eq!(signalled.signals.len(), 1);
        assert!(action.signals.is_empty());
    }

    #[test]
    fn signals_use_tagged_json() {
        let signal: Signal = serde_json::from_value(json!({
            "name": "navigation",
            "url": "https://example.com/",
            "type": "assert"
        }))
        .unwrap();
        assert_eq!(
            signal,
            Signal::Navigation {
                url: "https://example.com/".into(),
                kind: NavigationKind::Assert
            }
        );
    }
}
