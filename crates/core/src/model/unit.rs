use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validated unit label (trimmed, non-empty) used to group questions and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitName(String);

impl UnitName {
    /// Create a validated unit name.
    ///
    /// # Errors
    ///
    /// Returns `UnitNameError::Empty` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, UnitNameError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UnitNameError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UnitName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UnitName {
    type Error = UnitNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitName> for String {
    fn from(value: UnitName) -> Self {
        value.0
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnitNameError {
    #[error("unit name cannot be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_name_is_trimmed() {
        let unit = UnitName::new("  Fractions ").unwrap();
        assert_eq!(unit.as_str(), "Fractions");
    }

    #[test]
    fn blank_unit_name_is_rejected() {
        assert_eq!(UnitName::new("   ").unwrap_err(), UnitNameError::Empty);
    }
}
