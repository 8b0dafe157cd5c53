//! Export key newtype
//!
//! Export keys arrive as free strings from the invocation surface and from
//! configuration; the newtype keeps them from being confused with parameter
//! or provider names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier of an export definition
///
/// # Examples
///
/// ```
/// use csv_export::domain::ids::ExportKey;
/// use std::str::FromStr;
///
/// let key = ExportKey::from_str("claims").unwrap();
/// assert_eq!(key.as_str(), "claims");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExportKey(String);

impl ExportKey {
    /// Creates a new ExportKey, rejecting blank values
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err("Export key cannot be empty".to_string());
        }
        if key.trim() != key {
            return Err(format!(
                "Export key '{key}' must not have leading or trailing whitespace"
            ));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExportKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_key_valid() {
        let key = ExportKey::new("claims").unwrap();
        assert_eq!(key.as_str(), "claims");
        assert_eq!(key.to_string(), "claims");
    }

    #[test]
    fn test_export_key_blank() {
        assert!(ExportKey::new("").is_err());
        assert!(ExportKey::new("   ").is_err());
    }

    #[test]
    fn test_export_key_untrimmed() {
        assert!(ExportKey::new(" claims").is_err());
    }

    #[test]
    fn test_export_key_serde() {
        let key = ExportKey::new("claims").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"claims\"");
        let back: ExportKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
