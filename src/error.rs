//! Error types for shipment planning.

use thiserror::Error;

/// Result type alias for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Precondition failures that stop a planning run before any packing starts.
///
/// Items that merely cannot be placed are not errors; they are reported as
/// omitted items in the manifest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// The caller handed over an empty item list.
    #[error("no items to pack")]
    NoItems,

    /// An item carries a negative or non-finite measure.
    #[error("invalid item '{id}': {reason}")]
    InvalidItem { id: String, reason: String },

    /// A container profile has a non-positive extent or capacity.
    #[error("invalid container profile '{kind}': {reason}")]
    InvalidProfile { kind: String, reason: String },

    /// Planning parameters outside their valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
