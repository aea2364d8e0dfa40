//! Value errors

use crate::path::Path;

/// Errors converting values for output
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Unknown values have no concrete representation
    #[error("value at '{0}' is unknown")]
    Unknown(Path),

    /// JSON cannot represent NaN or infinities
    #[error("number at '{0}' is not finite")]
    NonFiniteNumber(Path),
}
