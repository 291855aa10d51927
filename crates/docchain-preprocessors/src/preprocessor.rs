//! Stage trait

use docchain_core::{ChainContext, Document, PathError};
use tracing::debug;

use crate::Result;

/// A configured transformation step of the chain.
///
/// Instances hold only their configuration and shared collaborator handles so
/// they can be shared between documents processed concurrently. Per document
/// state lives in the [`ChainContext`] or in values created inside
/// `process`.
pub trait Preprocessor: Send + Sync {
    /// Stage instance name
    fn name(&self) -> &str;

    /// Transform `document` in place.
    fn process(&self, document: &mut Document, context: &mut ChainContext) -> Result<()>;
}

/// Record a data warning for `stage` and log it at debug level.
pub(crate) fn data_warning(context: &mut ChainContext, stage: &str, message: String) {
    debug!(stage = %stage, "{}", message);
    context.add_warning(stage, message);
}

/// Report a failed path write as a data warning.
pub(crate) fn write_failed(context: &mut ChainContext, stage: &str, error: PathError) {
    data_warning(context, stage, format!("Can't write value: {}", error));
}
