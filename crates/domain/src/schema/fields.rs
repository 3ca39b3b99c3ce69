//! Schema fields and their pluggable property validation.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Identifies a field within its schema. Ids are never reused.
pub type FieldId = u32;

/// Checks a field's properties for internal consistency.
///
/// Returned property names are relative to the properties object; callers
/// prefix them with the path of the field.
pub trait ValidateProperties {
    fn validate(&self) -> Vec<ValidationError>;
}

/// Properties of a number field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberFieldProperties {
    label: Option<String>,
    hints: Option<String>,
    is_required: bool,
    min_value: Option<f64>,
    max_value: Option<f64>,
    default_value: Option<f64>,
    allowed_values: Option<Vec<f64>>,
}

impl NumberFieldProperties {
    pub fn builder() -> NumberFieldPropertiesBuilder {
        NumberFieldPropertiesBuilder::default()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    pub fn default_value(&self) -> Option<f64> {
        self.default_value
    }

    pub fn allowed_values(&self) -> Option<&[f64]> {
        self.allowed_values.as_deref()
    }
}

impl ValidateProperties for NumberFieldProperties {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let (Some(min), Some(max)) = (self.min_value, self.max_value)
            && min >= max
        {
            errors.push(ValidationError::new(
                "Max value must be greater than min value.",
                ["MinValue", "MaxValue"],
            ));
        }

        if self.allowed_values.is_some() && (self.min_value.is_some() || self.max_value.is_some()) {
            errors.push(ValidationError::new(
                "Either allowed values or range can be defined.",
                ["AllowedValues", "MinValue", "MaxValue"],
            ));
        }

        if let Some(default) = self.default_value {
            if let Some(min) = self.min_value
                && default < min
            {
                errors.push(ValidationError::new(
                    "Default value must be greater than min value.",
                    ["DefaultValue"],
                ));
            }

            if let Some(max) = self.max_value
                && default > max
            {
                errors.push(ValidationError::new(
                    "Default value must be less than max value.",
                    ["DefaultValue"],
                ));
            }
        }

        errors
    }
}

/// Builder for [`NumberFieldProperties`]; the built value is immutable.
#[derive(Debug, Default)]
pub struct NumberFieldPropertiesBuilder {
    properties: NumberFieldProperties,
}

impl NumberFieldPropertiesBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.properties.label = Some(label.into());
        self
    }

    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.properties.hints = Some(hints.into());
        self
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.properties.is_required = is_required;
        self
    }

    pub fn min_value(mut self, value: f64) -> Self {
        self.properties.min_value = Some(value);
        self
    }

    pub fn max_value(mut self, value: f64) -> Self {
        self.properties.max_value = Some(value);
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.properties.default_value = Some(value);
        self
    }

    pub fn allowed_values(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.properties.allowed_values = Some(values.into_iter().collect());
        self
    }

    pub fn build(self) -> NumberFieldProperties {
        self.properties
    }
}

/// Properties of a string field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringFieldProperties {
    label: Option<String>,
    hints: Option<String>,
    is_required: bool,
    min_length: Option<u32>,
    max_length: Option<u32>,
    default_value: Option<String>,
    allowed_values: Option<Vec<String>>,
}

impl StringFieldProperties {
    pub fn builder() -> StringFieldPropertiesBuilder {
        StringFieldPropertiesBuilder::default()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn min_length(&self) -> Option<u32> {
        self.min_length
    }

    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn allowed_values(&self) -> Option<&[String]> {
        self.allowed_values.as_deref()
    }
}

impl ValidateProperties for StringFieldProperties {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let (Some(min), Some(max)) = (self.min_length, self.max_length)
            && min >= max
        {
            errors.push(ValidationError::new(
                "Max length must be greater than min length.",
                ["MinLength", "MaxLength"],
            ));
        }

        if self.allowed_values.is_some() && (self.min_length.is_some() || self.max_length.is_some())
        {
            errors.push(ValidationError::new(
                "Either allowed values or min and max length can be defined.",
                ["AllowedValues", "MinLength", "MaxLength"],
            ));
        }

        if let Some(default) = &self.default_value {
            let length = default.chars().count();

            if let Some(min) = self.min_length
                && length < min as usize
            {
                errors.push(ValidationError::new(
                    "Default value must not be shorter than min length.",
                    ["DefaultValue"],
                ));
            }

            if let Some(max) = self.max_length
                && length > max as usize
            {
                errors.push(ValidationError::new(
                    "Default value must not be longer than max length.",
                    ["DefaultValue"],
                ));
            }
        }

        errors
    }
}

/// Builder for [`StringFieldProperties`]; the built value is immutable.
#[derive(Debug, Default)]
pub struct StringFieldPropertiesBuilder {
    properties: StringFieldProperties,
}

impl StringFieldPropertiesBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.properties.label = Some(label.into());
        self
    }

    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.properties.hints = Some(hints.into());
        self
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.properties.is_required = is_required;
        self
    }

    pub fn min_length(mut self, value: u32) -> Self {
        self.properties.min_length = Some(value);
        self
    }

    pub fn max_length(mut self, value: u32) -> Self {
        self.properties.max_length = Some(value);
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.properties.default_value = Some(value.into());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> StringFieldProperties {
        self.properties
    }
}

/// Properties of a boolean field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanFieldProperties {
    pub label: Option<String>,
    pub is_required: bool,
    pub default_value: Option<bool>,
}

impl ValidateProperties for BooleanFieldProperties {
    fn validate(&self) -> Vec<ValidationError> {
        Vec::new()
    }
}

/// Properties of any supported field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FieldProperties {
    Number(NumberFieldProperties),
    String(StringFieldProperties),
    Boolean(BooleanFieldProperties),
}

impl FieldProperties {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldProperties::Number(_) => "Number",
            FieldProperties::String(_) => "String",
            FieldProperties::Boolean(_) => "Boolean",
        }
    }
}

impl ValidateProperties for FieldProperties {
    fn validate(&self) -> Vec<ValidationError> {
        match self {
            FieldProperties::Number(p) => p.validate(),
            FieldProperties::String(p) => p.validate(),
            FieldProperties::Boolean(p) => p.validate(),
        }
    }
}

impl From<NumberFieldProperties> for FieldProperties {
    fn from(properties: NumberFieldProperties) -> Self {
        FieldProperties::Number(properties)
    }
}

impl From<StringFieldProperties> for FieldProperties {
    fn from(properties: StringFieldProperties) -> Self {
        FieldProperties::String(properties)
    }
}

impl From<BooleanFieldProperties> for FieldProperties {
    fn from(properties: BooleanFieldProperties) -> Self {
        FieldProperties::Boolean(properties)
    }
}

/// A field as requested when creating a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub properties: FieldProperties,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, properties: impl Into<FieldProperties>) -> Self {
        Self {
            name: name.into(),
            properties: properties.into(),
        }
    }
}

/// A field of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub properties: FieldProperties,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: Vec<ValidationError>) -> Vec<String> {
        errors.into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_valid_number_properties_pass() {
        let properties = NumberFieldProperties::builder()
            .min_value(0.0)
            .max_value(10.0)
            .default_value(5.0)
            .build();
        assert!(properties.validate().is_empty());
    }

    #[test]
    fn test_number_range_must_be_increasing() {
        let properties = NumberFieldProperties::builder()
            .min_value(10.0)
            .max_value(10.0)
            .build();

        let errors = properties.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].property_names, vec!["MinValue", "MaxValue"]);
    }

    #[test]
    fn test_number_reports_all_violations() {
        let properties = NumberFieldProperties::builder()
            .min_value(5.0)
            .max_value(1.0)
            .default_value(10.0)
            .allowed_values([1.0, 2.0])
            .build();

        assert_eq!(
            messages(properties.validate()),
            vec![
                "Max value must be greater than min value.",
                "Either allowed values or range can be defined.",
                "Default value must be less than max value.",
            ]
        );
    }

    #[test]
    fn test_number_default_below_min() {
        let properties = NumberFieldProperties::builder()
            .min_value(5.0)
            .default_value(1.0)
            .build();
        assert_eq!(
            messages(properties.validate()),
            vec!["Default value must be greater than min value."]
        );
    }

    #[test]
    fn test_string_length_rules() {
        let properties = StringFieldProperties::builder()
            .min_length(5)
            .max_length(3)
            .default_value("ab")
            .allowed_values(["a"])
            .build();

        assert_eq!(
            messages(properties.validate()),
            vec![
                "Max length must be greater than min length.",
                "Either allowed values or min and max length can be defined.",
                "Default value must not be shorter than min length.",
            ]
        );
    }

    #[test]
    fn test_properties_serialize_with_kind() {
        let properties: FieldProperties = NumberFieldProperties::builder().max_value(3.0).build().into();
        let json = serde_json::to_value(&properties).unwrap();
        assert_eq!(json["kind"], "Number");
        assert_eq!(properties.kind(), "Number");
    }
}
