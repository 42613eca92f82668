//! Core types for selector synthesis

use serde::{Deserialize, Serialize};

/// Selector engine a token is evaluated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorEngine {
    /// Plain CSS, joinable with a descendant combinator
    Css,

    /// Text engine (`"exact"` or `/regex/`)
    Text,

    /// Structural XPath
    Xpath,
}

impl SelectorEngine {
    /// Get engine name as used in the `engine=body` selector prefix
    pub fn name(&self) -> &'static str {
        match self {
            SelectorEngine::Css => "css",
            SelectorEngine::Text => "text",
            SelectorEngine::Xpath => "xpath",
        }
    }
}

/// One locator fragment tied to a single DOM ancestor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorToken {
    pub engine: SelectorEngine,
    pub selector: String,
}

impl SelectorToken {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            engine: SelectorEngine::Css,
            selector: selector.into(),
        }
    }

    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            engine: SelectorEngine::Text,
            selector: selector.into(),
        }
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self {
            engine: SelectorEngine::Xpath,
            selector: selector.into(),
        }
    }

    /// Render the token as it appears inside a full selector
    pub fn render(&self) -> String {
        match self.engine {
            SelectorEngine::Css => self.selector.clone(),
            engine => format!("{}={}", engine.name(), self.selector),
        }
    }
}

/// Join tokens outermost-first.
///
/// Two adjacent css tokens are concatenated with a descendant combinator,
/// anything involving another engine is chained with `>>`.
pub fn join_selector(path: &[SelectorToken]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(path.len() * 2);
    let mut last_engine: Option<SelectorEngine> = None;
    for token in path {
        if let Some(last) = last_engine {
            if last != SelectorEngine::Css || token.engine != SelectorEngine::Css {
                parts.push(">>".to_string());
            }
        }
        last_engine = Some(token.engine);
        parts.push(token.render());
    }
    parts.join(" ")
}

/// Where a synthesized selector came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorSource {
    /// Candidate path accepted during the ancestor walk
    CandidatePath,

    /// Structural XPath fallback
    XpathFallback,
}

/// Result of one synthesis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub selector: String,
    pub source: SelectorSource,

    /// Number of candidate queries issued during the walk
    pub queries: usize,
}
