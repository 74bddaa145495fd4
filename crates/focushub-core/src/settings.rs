//! User settings: the single `user_settings` row per installation.
//!
//! Read once at startup, written through [`SettingsPatch`] whenever the user
//! changes something.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::gateway::de_opt_id;

/// UI language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Zh => write!(f, "zh"),
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => Err(ValidationError::InvalidValue {
                field: "language".into(),
                message: format!("unsupported language '{other}', expected en or zh"),
            }),
        }
    }
}

/// Timer and presentation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub language: Language,
    /// Focus session length in minutes.
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    /// Focus sessions before a long break.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomos: bool,
    #[serde(default = "default_timer_sound")]
    pub timer_sound: String,
    /// Forgive missed days when the user returns within 24 hours.
    #[serde(default = "default_true")]
    pub elastic_streak: bool,
    #[serde(default = "default_language_tone")]
    pub language_tone: String,
}

fn default_focus_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_timer_sound() -> String {
    "bell".into()
}
fn default_true() -> bool {
    true
}
fn default_language_tone() -> String {
    "gentle".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: None,
            language: Language::En,
            focus_duration: default_focus_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            long_break_interval: default_long_break_interval(),
            auto_start_breaks: false,
            auto_start_pomos: false,
            timer_sound: default_timer_sound(),
            elastic_streak: true,
            language_tone: default_language_tone(),
        }
    }
}

/// Partial settings update. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_breaks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_pomos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_streak: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_tone: Option<String>,
}

impl SettingsPatch {
    pub fn language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::default()
        }
    }

    pub fn focus_duration(minutes: u32) -> Self {
        Self {
            focus_duration: Some(minutes),
            ..Self::default()
        }
    }

    /// Build a single-field patch from a `key`/`value` pair as typed on a
    /// command line. The value is parsed according to the field's type.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: key.to_string(),
            message,
        };

        let template = serde_json::to_value(Settings::default()).map_err(|e| invalid(e.to_string()))?;
        let existing = template
            .get(key)
            .ok_or_else(|| invalid("unknown settings key".into()))?;

        let parsed = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                    .into(),
            ),
            _ => serde_json::Value::String(value.to_string()),
        };

        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), parsed);
        let patch: SettingsPatch = serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| invalid(e.to_string()))?;
        patch.validate()?;
        Ok(patch)
    }

    /// Reject values the timer cannot work with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.focus_duration == Some(0) {
            return Err(ValidationError::InvalidDuration);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Settings {
    /// Apply a patch locally.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.language {
            self.language = v;
        }
        if let Some(v) = patch.focus_duration {
            self.focus_duration = v;
        }
        if let Some(v) = patch.short_break {
            self.short_break = v;
        }
        if let Some(v) = patch.long_break {
            self.long_break = v;
        }
        if let Some(v) = patch.long_break_interval {
            self.long_break_interval = v;
        }
        if let Some(v) = patch.auto_start_breaks {
            self.auto_start_breaks = v;
        }
        if let Some(v) = patch.auto_start_pomos {
            self.auto_start_pomos = v;
        }
        if let Some(v) = &patch.timer_sound {
            self.timer_sound = v.clone();
        }
        if let Some(v) = patch.elastic_streak {
            self.elastic_streak = v;
        }
        if let Some(v) = &patch.language_tone {
            self.language_tone = v.clone();
        }
    }

    /// Get a settings value as string.
    pub fn get(&self, key: &str) -> Option<String> {
        if key == "id" {
            return None;
        }
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Names of all user-editable fields.
    pub fn keys() -> Vec<String> {
        match serde_json::to_value(Settings::default()) {
            Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}
