use thiserror::Error;

/// Errors raised while building a PUF.
///
/// Only construction can fail. Once a primitive exists every evaluation
/// path is total over correctly shaped input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PufError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PufError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PufError::InvalidConfiguration(msg.into())
    }
}
