use thiserror::Error;

/// Errors surfaced synchronously by holder operations.
///
/// Absent copies and empty snapshots are not errors; they are reported as
/// [`RemoveOutcome::NotFound`](crate::RemoveOutcome::NotFound) and `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HolderError {
    /// The write was rejected and the holder is unchanged.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}
