//! Field-attributed validation failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One reason a command was rejected, naming the offending properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    pub property_names: Vec<String>,
}

impl ValidationError {
    pub fn new<I, P>(message: impl Into<String>, property_names: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            message: message.into(),
            property_names: property_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a copy with every property name prefixed, e.g. `Fields[0].Properties.`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            message: self.message.clone(),
            property_names: self
                .property_names
                .iter()
                .map(|name| format!("{prefix}{name}"))
                .collect(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.property_names.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.property_names.join(", "))
        }
    }
}

/// Collects every violated rule before failing.
///
/// Rules are never short-circuited, so a rejected command reports all of its
/// problems at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error<I, P>(&mut self, message: impl Into<String>, property_names: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.errors.push(ValidationError::new(message, property_names));
    }

    /// Records an error that is not tied to a property.
    pub fn message(&mut self, message: impl Into<String>) {
        self.errors.push(ValidationError::new(message, Vec::<String>::new()));
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fails with `message` when any rule was violated.
    pub fn finish(self, message: &str) -> Result<(), DomainError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation {
                message: message.to_string(),
                errors: self.errors,
            })
        }
    }
}

/// Returns true for lowercase, dash-separated names such as `my-app-2`.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs() {
        assert!(is_slug("acme"));
        assert!(is_slug("my-app-2"));
        assert!(!is_slug(""));
        assert!(!is_slug("Acme"));
        assert!(!is_slug("my--app"));
        assert!(!is_slug("-app"));
        assert!(!is_slug("my app"));
    }

    #[test]
    fn test_validator_collects_all_errors() {
        let mut validator = Validator::new();
        validator.error("first", ["A"]);
        validator.error("second", ["B", "C"]);

        let err = validator.finish("Cannot do it.").unwrap_err();
        match err {
            DomainError::Validation { message, errors } => {
                assert_eq!(message, "Cannot do it.");
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[1].property_names, vec!["B", "C"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_validator_passes() {
        assert!(Validator::new().finish("unused").is_ok());
    }

    #[test]
    fn test_prefix_applies_to_every_property() {
        let error = ValidationError::new("bad", ["MinValue", "MaxValue"]).with_prefix("Properties.");
        assert_eq!(
            error.property_names,
            vec!["Properties.MinValue", "Properties.MaxValue"]
        );
    }
}
