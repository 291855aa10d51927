//! Built-in stages
//!
//! Each stage is built from its instance name and a flat settings mapping and
//! validates that mapping up front, so a chain that builds is a chain that
//! runs.

mod add_multiple_values;
mod add_value;
mod regex_capture;
mod remove_fields;
mod required_validator;
mod trim_string;
mod value_mapper;
mod values_collecting;

pub use add_multiple_values::AddMultipleValuesStage;
pub use add_value::AddValueStage;
pub use regex_capture::RegexCaptureStage;
pub use remove_fields::RemoveFieldsStage;
pub use required_validator::RequiredValidatorStage;
pub use trim_string::TrimStringStage;
pub use value_mapper::ValueMapperStage;
pub use values_collecting::ValuesCollectingStage;

/// Stage type ids used in pipeline configuration
pub mod types {
    pub const ADD_VALUE: &str = "add_value";
    pub const ADD_MULTIPLE_VALUES: &str = "add_multiple_values";
    pub const REMOVE_FIELDS: &str = "remove_fields";
    pub const TRIM_STRING: &str = "trim_string";
    pub const REGEX_CAPTURE: &str = "regex_capture";
    pub const VALUE_MAPPER: &str = "value_mapper";
    pub const REQUIRED: &str = "required";
    pub const VALUES_COLLECTING: &str = "values_collecting";
    pub const LOOKUP: &str = "lookup";
}

pub const CFG_FIELD: &str = "field";
pub const CFG_SOURCE_FIELD: &str = "source_field";
pub const CFG_TARGET_FIELD: &str = "target_field";

#[cfg(test)]
pub(crate) fn doc(value: docchain_core::Value) -> docchain_core::Document {
    match value {
        docchain_core::Value::Object(map) => map,
        _ => panic!("test document must be an object"),
    }
}
