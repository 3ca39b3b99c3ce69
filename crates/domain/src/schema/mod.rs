//! Schema aggregate and field definitions.

mod aggregate;
mod commands;
mod events;
mod fields;
pub mod guards;

pub use aggregate::Schema;
pub use commands::*;
pub use events::SchemaEvent;
pub use fields::{
    BooleanFieldProperties, Field, FieldDefinition, FieldId, FieldProperties,
    NumberFieldProperties, NumberFieldPropertiesBuilder, StringFieldProperties,
    StringFieldPropertiesBuilder, ValidateProperties,
};
