//! Core data types for cask

use serde::{Deserialize, Serialize};

/// Validated bucket name
///
/// Accepts `[A-Za-z0-9][A-Za-z0-9_-]*[A-Za-z0-9]+`: alphanumeric first and
/// last character, hyphens and underscores allowed in between, at least two
/// characters total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketName(String);

impl BucketName {
    /// Create a new bucket name with validation
    pub fn new(name: &str) -> crate::Result<Self> {
        let mut chars = name.chars();
        let first = chars.next().ok_or_else(|| {
            crate::CaskError::InvalidBucketName("empty name".to_string())
        })?;

        let last = name
            .chars()
            .last()
            .filter(|_| name.len() >= 2)
            .ok_or_else(|| {
                crate::CaskError::InvalidBucketName(format!("name too short: '{}'", name))
            })?;

        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(crate::CaskError::InvalidBucketName(format!(
                "must start and end with an alphanumeric character: '{}'",
                name
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::CaskError::InvalidBucketName(format!(
                "invalid characters in '{}'",
                name
            )));
        }

        Ok(BucketName(name.to_string()))
    }

    /// Get the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object name within a bucket
///
/// Object names are arbitrary non-empty strings and may contain `/` and `:`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectName(String);

impl ObjectName {
    /// Create a new object name with validation
    pub fn new(name: &str) -> crate::Result<Self> {
        if name.is_empty() {
            return Err(crate::CaskError::InvalidObjectName(
                "empty name".to_string(),
            ));
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(crate::CaskError::InvalidObjectName(
                "control characters not allowed".to_string(),
            ));
        }

        Ok(ObjectName(name.to_string()))
    }

    /// Get the object name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
