//! Application settings surface.
//!
//! # Responsibilities
//! - Hold the recognised settings (`x-powered-by`, `env`, `etag`,
//!   `trust proxy`, `subdomain offset`, `cookie secret`) as typed fields
//! - Keep unrecognised keys verbatim in `custom`
//! - Offer the string-keyed `get`/`set`/`enable`/`disable` API
//!
//! # Design Decisions
//! - Owned by the application and frozen behind `Arc` once serving starts
//! - Type mismatches on recognised keys are errors, not silent coercions

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const X_POWERED_BY: &str = "x-powered-by";
pub const ENV: &str = "env";
pub const ETAG: &str = "etag";
pub const TRUST_PROXY: &str = "trust proxy";
pub const SUBDOMAIN_OFFSET: &str = "subdomain offset";
pub const COOKIE_SECRET: &str = "cookie secret";

/// Error type for settings updates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("setting {key:?} expects a {expected} value")]
    TypeMismatch { key: String, expected: &'static str },
}

/// A setting value as stored in the settings map.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl SettingValue {
    fn truthy(&self) -> bool {
        match self {
            SettingValue::Bool(b) => *b,
            SettingValue::Str(s) => s.parse::<bool>().unwrap_or(false),
            SettingValue::Int(_) | SettingValue::Float(_) => false,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Float(x) => write!(f, "{}", x),
            SettingValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<usize> for SettingValue {
    fn from(v: usize) -> Self {
        SettingValue::Int(v as i64)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Str(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Str(v)
    }
}

/// ETag generation mode. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EtagMode {
    #[default]
    Weak,
    Strong,
    None,
}

impl EtagMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EtagMode::Weak => "weak",
            EtagMode::Strong => "strong",
            EtagMode::None => "none",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "weak" => Some(EtagMode::Weak),
            "strong" => Some(EtagMode::Strong),
            "none" => Some(EtagMode::None),
            _ => None,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "x-powered-by")]
    pub x_powered_by: bool,

    pub env: String,

    pub etag: EtagMode,

    #[serde(rename = "trust proxy")]
    pub trust_proxy: bool,

    #[serde(rename = "subdomain offset")]
    pub subdomain_offset: usize,

    /// Secret used to verify signed cookies on inbound requests.
    #[serde(rename = "cookie secret", skip_serializing_if = "Option::is_none")]
    pub cookie_secret: Option<String>,

    /// Unrecognised keys, stored verbatim.
    #[serde(flatten)]
    pub custom: BTreeMap<String, SettingValue>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            x_powered_by: true,
            env: "development".to_string(),
            etag: EtagMode::Weak,
            trust_proxy: false,
            subdomain_offset: 2,
            cookie_secret: None,
            custom: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Look up a setting by key.
    pub fn get(&self, key: &str) -> Option<SettingValue> {
        match key {
            X_POWERED_BY => Some(SettingValue::Bool(self.x_powered_by)),
            ENV => Some(SettingValue::Str(self.env.clone())),
            ETAG => Some(SettingValue::Str(self.etag.as_str().to_string())),
            TRUST_PROXY => Some(SettingValue::Bool(self.trust_proxy)),
            SUBDOMAIN_OFFSET => Some(SettingValue::Int(self.subdomain_offset as i64)),
            COOKIE_SECRET => self.cookie_secret.clone().map(SettingValue::Str),
            _ => self.custom.get(key).cloned(),
        }
    }

    /// Assign a setting. Recognised keys are type-checked.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<SettingValue>,
    ) -> Result<&mut Self, SettingsError> {
        let value = value.into();
        let mismatch = |expected| SettingsError::TypeMismatch {
            key: key.to_string(),
            expected,
        };

        match (key, value) {
            (X_POWERED_BY, SettingValue::Bool(b)) => self.x_powered_by = b,
            (X_POWERED_BY, _) => return Err(mismatch("boolean")),
            (TRUST_PROXY, SettingValue::Bool(b)) => self.trust_proxy = b,
            (TRUST_PROXY, _) => return Err(mismatch("boolean")),
            (ENV, SettingValue::Str(s)) => self.env = s,
            (ENV, _) => return Err(mismatch("string")),
            (ETAG, SettingValue::Str(s)) => {
                self.etag = EtagMode::parse(&s).ok_or_else(|| mismatch("weak|strong|none"))?
            }
            (ETAG, SettingValue::Bool(b)) => {
                self.etag = if b { EtagMode::Weak } else { EtagMode::None }
            }
            (ETAG, _) => return Err(mismatch("weak|strong|none")),
            (SUBDOMAIN_OFFSET, SettingValue::Int(i)) if i >= 0 => self.subdomain_offset = i as usize,
            (SUBDOMAIN_OFFSET, _) => return Err(mismatch("non-negative integer")),
            (COOKIE_SECRET, SettingValue::Str(s)) => self.cookie_secret = Some(s),
            (COOKIE_SECRET, _) => return Err(mismatch("string")),
            (_, value) => {
                self.custom.insert(key.to_string(), value);
            }
        }
        Ok(self)
    }

    /// Set a boolean setting to `true`. `etag` becomes `weak`.
    pub fn enable(&mut self, key: &str) -> Result<&mut Self, SettingsError> {
        self.set(key, true)
    }

    /// Set a boolean setting to `false`. `etag` becomes `none`.
    pub fn disable(&mut self, key: &str) -> Result<&mut Self, SettingsError> {
        self.set(key, false)
    }

    pub fn enabled(&self, key: &str) -> bool {
        match key {
            ETAG => self.etag != EtagMode::None,
            _ => self.get(key).map(|v| v.truthy()).unwrap_or(false),
        }
    }

    pub fn disabled(&self, key: &str) -> bool {
        !self.enabled(key)
    }
}
