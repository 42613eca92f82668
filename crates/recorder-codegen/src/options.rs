//! Launch and context options rendered into script headers.

use serde::{Deserialize, Serialize};

/// Language-neutral option value
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<OptionValue>),
    Object(Vec<(&'static str, OptionValue)>),
}

impl OptionValue {
    /// Numbers without a fractional part print as integers.
    pub fn format_number(value: f64) -> String {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{}", value)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchOptions {
    pub headless: Option<bool>,
    pub channel: Option<String>,
    pub slow_mo: Option<u64>,
}

impl LaunchOptions {
    pub fn entries(&self) -> Vec<(&'static str, OptionValue)> {
        let mut entries = Vec::new();
        if let Some(headless) = self.headless {
            entries.push(("headless", OptionValue::Bool(headless)));
        }
        if let Some(channel) = &self.channel {
            entries.push(("channel", OptionValue::Str(channel.clone())));
        }
        if let Some(slow_mo) = self.slow_mo {
            entries.push(("slowMo", OptionValue::Int(slow_mo as i64)));
        }
        entries
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    Light,
    Dark,
    NoPreference,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
            ColorScheme::NoPreference => "no-preference",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Browser context options; unset fields are omitted from the header.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextOptions {
    pub color_scheme: Option<ColorScheme>,
    pub geolocation: Option<Geolocation>,
    pub locale: Option<String>,
    pub permissions: Vec<String>,
    pub timezone_id: Option<String>,
    pub user_agent: Option<String>,
    pub viewport: Option<Viewport>,
    #[serde(rename = "ignoreHTTPSErrors")]
    pub ignore_https_errors: Option<bool>,
}

impl ContextOptions {
    pub fn entries(&self) -> Vec<(&'static str, OptionValue)> {
        let mut entries = Vec::new();
        if let Some(scheme) = self.color_scheme {
            entries.push(("colorScheme", OptionValue::Str(scheme.as_str().to_string())));
        }
        if let Some(geo) = self.geolocation {
            entries.push((
                "geolocation",
                OptionValue::Object(vec![
                    ("latitude", OptionValue::Float(geo.latitude)),
                    ("longitude", OptionValue::Float(geo.longitude)),
                ]),
            ));
        }
        if let Some(locale) = &self.locale {
            entries.push(("locale", OptionValue::Str(locale.clone())));
        }
        if !self.permissions.is_empty() {
            entries.push((
                "permissions",
                OptionValue::List(
                    self.permissions
                        .iter()
                        .cloned()
                        .map(OptionValue::Str)
                        .collect(),
                ),
            ));
        }
        if let Some(timezone) = &self.timezone_id {
            entries.push(("timezoneId", OptionValue::Str(timezone.clone())));
        }
        if let Some(agent) = &self.user_agent {
            entries.push(("userAgent", OptionValue::Str(agent.clone())));
        }
        if let Some(viewport) = self.viewport {
            entries.push((
                "viewport",
                OptionValue::Object(vec![
                    ("width", OptionValue::Int(viewport.width as i64)),
                    ("height", OptionValue::Int(viewport.height as i64)),
                ]),
            ));
        }
        if let Some(ignore) = self.ignore_https_errors {
            entries.push(("ignoreHTTPSErrors", OptionValue::Bool(ignore)));
        }
        entries
    }
}

/// Everything a language needs to render the script preamble.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptHeader {
    pub browser_name: String,
    #[serde(default)]
    pub launch: LaunchOptions,
    #[serde(default)]
    pub context: ContextOptions,
    #[serde(default)]
    pub device: Option<String>,
}

impl ScriptHeader {
    pub fn new(browser_name: impl Into<String>) -> Self {
        Self {
            browser_name: browser_name.into(),
            launch: LaunchOptions::default(),
            context: ContextOptions::default(),
            device: None,
        }
    }
}

impl Default for ScriptHeader {
    fn default() -> Self {
        Self::new("chromium")
    }
}
