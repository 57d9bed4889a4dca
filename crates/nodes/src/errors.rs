//! Node execution errors.

use gateway::{DispatchError, GatewayError};
use thiserror::Error;

/// Why a single item failed.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The item's parameter overrides do not fit the parameter schema.
    #[error("Invalid item parameters: {0}")]
    Parameters(#[from] serde_json::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Errors that abort a batch.
///
/// Only produced when continue-on-failure is off; otherwise item failures
/// become error records in the output.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Item {item_index} failed: {source}")]
    Item {
        /// Zero-based index of the failing input item.
        item_index: usize,
        #[source]
        source: ItemError,
    },
}
