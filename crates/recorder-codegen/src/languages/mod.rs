//! Per-language rendering of headers, actions and footers.

mod csharp;
mod formatter;
mod javascript;
mod python;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionInContext, NavigationKind, Signal};
use crate::errors::CodegenError;
use crate::options::ScriptHeader;

pub use csharp::CSharpLanguageGenerator;
pub use javascript::JavaScriptLanguageGenerator;
pub use python::PythonLanguageGenerator;

/// Renders one target language.
///
/// `generate_action` must be pure: the generator re-renders the same action
/// whenever a signal is attached after the fact.
pub trait LanguageGenerator: Send + Sync {
    fn language(&self) -> Language;

    fn generate_header(&self, header: &ScriptHeader) -> String;

    fn generate_action(&self, action: &ActionInContext, performing_action: bool) -> String;

    fn generate_footer(&self) -> String;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    #[default]
    #[serde(alias = "js")]
    Javascript,
    #[serde(alias = "py")]
    Python,
    PythonAsync,
    #[serde(alias = "cs")]
    Csharp,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Javascript,
        Language::Python,
        Language::PythonAsync,
        Language::Csharp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::PythonAsync => "python-async",
            Language::Csharp => "csharp",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Javascript => "js",
            Language::Python | Language::PythonAsync => "py",
            Language::Csharp => "cs",
        }
    }

    pub fn generator(&self) -> Box<dyn LanguageGenerator> {
        match self {
            Language::Javascript => Box::new(JavaScriptLanguageGenerator),
            Language::Python => Box::new(PythonLanguageGenerator::sync()),
            Language::PythonAsync => Box::new(PythonLanguageGenerator::asynchronous()),
            Language::Csharp => Box::new(CSharpLanguageGenerator),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::Javascript),
            "python" | "py" => Ok(Language::Python),
            "python-async" => Ok(Language::PythonAsync),
            "csharp" | "cs" | "c#" => Ok(Language::Csharp),
            other => Err(CodegenError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Signals of one action, last of each kind wins.
#[derive(Debug, Default)]
pub(crate) struct SignalSet<'a> {
    pub(crate) navigation: Option<(&'a str, NavigationKind)>,
    pub(crate) popup: Option<&'a str>,
    pub(crate) download: bool,
    pub(crate) dialog: Option<&'a str>,
}

impl<'a> SignalSet<'a> {
    pub(crate) fn collect(signals: &'a [Signal]) -> Self {
        let mut set = SignalSet::default();
        for signal in signals {
            match signal {
                Signal::Navigation { url, kind } => set.navigation = Some((url.as_str(), *kind)),
                Signal::Popup { popup_alias } => set.popup = Some(popup_alias.as_str()),
                Signal::Download => set.download = true,
                Signal::Dialog { dialog_alias } => set.dialog = Some(dialog_alias.as_str()),
            }
        }
        set
    }

    /// Navigation to wait for before the call completes.
    pub(crate) fn awaited_navigation(&self, performing_action: bool) -> Option<&'a str> {
        match self.navigation {
            Some((url, kind)) if !renders_assertion(kind, performing_action) => Some(url),
            _ => None,
        }
    }

    /// Navigation that already happened and is only asserted.
    pub(crate) fn asserted_navigation(&self, performing_action: bool) -> Option<&'a str> {
        match self.navigation {
            Some((url, kind)) if renders_assertion(kind, performing_action) => Some(url),
            _ => None,
        }
    }
}

fn renders_assertion(kind: NavigationKind, performing_action: bool) -> bool {
    performing_action || kind == NavigationKind::Assert
}

/// New pages start blank; only real urls get an explicit goto.
pub(crate) fn should_load_url(url: &str) -> bool {
    !url.is_empty() && url != "about:blank" && url != "chrome://newtab/"
}

pub(crate) fn to_pascal(value: &str) -> String {
    value
        .split(|c: char| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
