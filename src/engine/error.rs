//! Error types for cart mutations.

use thiserror::Error;

/// Precondition violation on a cart mutation.
///
/// This is the only rejecting case: mutations aimed at a line item that does
/// not exist are silent no-ops, and persistence problems degrade to a logged
/// warning rather than an error. Unknown metals are unrepresentable at the
/// type level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("weight must be positive, got {weight_grams}g")]
    InvalidWeight { weight_grams: u32 },
}
