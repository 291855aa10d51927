//! CLI command implementations

pub mod run;
pub mod stages;
pub mod validate;
