//! Settings and options of a build context
//!
//! Settings are flat `key = "value"` pairs (`os`, `os.version`, `arch`,
//! `os.fat_arch`, ...). Options are recipe-level switches such as
//! `header_only` or `multi_arch`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::defaults::{ARCH_SETTING, OS_SETTING};

/// Build settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the setting is declared at all
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a setting, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a setting
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Target operating system
    pub fn os(&self) -> Option<&str> {
        self.get(OS_SETTING)
    }

    /// Target architecture
    pub fn arch(&self) -> Option<&str> {
        self.get(ARCH_SETTING)
    }

    /// Iterate settings in key order
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply a `key=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), String> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{assignment}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty setting name in '{assignment}'"));
        }
        self.set(key, value.trim());
        Ok(())
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self.items().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&pairs.join(", "))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Settings {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Value of a recipe option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// `true` / `false`
    Bool(bool),
    /// Integer option
    Int(i64),
    /// Free-form text
    Text(String),
}

impl OptionValue {
    /// Parse a command-line value: flags and integers first, text otherwise
    pub fn parse(value: &str) -> Self {
        match value {
            "true" | "True" => OptionValue::Bool(true),
            "false" | "False" => OptionValue::Bool(false),
            other => other
                .parse::<i64>()
                .map_or_else(|_| OptionValue::Text(other.to_string()), OptionValue::Int),
        }
    }

    /// Interpret the value as a flag
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Int(n) => Some(*n != 0),
            OptionValue::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

/// Recipe options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, OptionValue>);

impl Options {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an option
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Look up an option as a flag; `None` when absent or not a flag
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(OptionValue::as_bool)
    }

    /// Set an option
    pub fn set(&mut self, key: impl Into<String>, value: OptionValue) {
        self.0.insert(key.into(), value);
    }

    /// Apply a `key=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), String> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{assignment}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty option name in '{assignment}'"));
        }
        self.set(key, OptionValue::parse(value.trim()));
        Ok(())
    }
}
