//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid pass configuration, rejected ball sets, malformed per-frame control values and
//! output buffers too small for the worst-case emission of a pass.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid ball set: {0}")]
    InvalidBalls(String),

    #[error("invalid frame control: {0}")]
    InvalidControl(String),

    #[error("vertex buffer too small: pass may emit {required} vertices, capacity is {capacity}")]
    Capacity { required: usize, capacity: usize },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn from_str_allocates_owned_message() {
        let err: Error = "issue".into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "issue"));
    }

    #[test]
    fn capacity_message_names_both_sizes() {
        let err = Error::Capacity {
            required: 1500,
            capacity: 100,
        };
        let text = err.to_string();
        assert!(text.contains("1500"));
        assert!(text.contains("100"));
    }
}
