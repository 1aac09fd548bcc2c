use std::fmt;

/// Errors reported by the boolean operations.
///
/// Everything comes back through the normal `Result` channel; the engine
/// does not panic on malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The nested coordinate arrays do not describe a polygon or
    /// multipolygon the engine can work with: an empty ring, a point with
    /// fewer than two ordinates, or a degenerate segment.
    InvalidInput(String),
    /// A configurable resource cap was exceeded mid-operation. The message
    /// names the environment variable that raises the cap.
    ResourceExceeded(String),
    /// An internal invariant failed. This indicates a bug in the engine,
    /// not a problem with the input; the message carries the offending
    /// segment and points for a bug report.
    Internal(String),
    /// The operation name is not one of `union`, `intersection`, `xor`,
    /// `difference`.
    UnknownOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) | Error::ResourceExceeded(msg) | Error::Internal(msg) => {
                write!(f, "{msg}")
            }
            Error::UnknownOperation(name) => write!(
                f,
                "Unrecognized operation type \"{name}\"; expected one of \
                 union, intersection, xor, difference."
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = Error::InvalidInput("Input geometry is not a valid polygon".into());
        assert_eq!(err.to_string(), "Input geometry is not a valid polygon");

        let err = Error::UnknownOperation("subtract".into());
        assert!(err.to_string().contains("subtract"));
        assert!(err.to_string().contains("difference"));
    }
}
