//! Error types and Result aliases for Overseer

use std::fmt;

/// Result type alias for Overseer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Overseer
#[derive(Debug)]
pub enum Error {
    // === Launch errors (surfaced synchronously from run calls) ===
    /// OS-level process creation failed; no handle was registered
    LaunchFailed {
        command: String,
        reason: String,
    },

    /// Failed to allocate a pseudoterminal
    PtyCreationFailed {
        command: String,
        reason: String,
    },

    /// Empty executable or command string
    EmptyCommand,

    /// Pseudoterminal dimensions must be positive
    InvalidPtySize {
        cols: u16,
        rows: u16,
    },

    // === Runtime errors (routed to on_error or returned from operations) ===
    /// Standard input channel is already closed
    StdinClosed,

    /// Operation requires a pseudoterminal but the process was started
    /// with plain pipes
    UnsupportedOperation {
        operation: String,
    },

    /// Failed to resize the pseudoterminal
    PtyResizeFailed {
        reason: String,
    },

    /// Failed to send a signal to the process
    SignalSendFailed {
        signal: String,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LaunchFailed { command, reason } => {
                write!(f, "Failed to launch '{}': {}", command, reason)
            }
            Error::PtyCreationFailed { command, reason } => {
                write!(f, "Failed to create PTY for '{}': {}", command, reason)
            }
            Error::EmptyCommand => {
                write!(f, "Command cannot be empty")
            }
            Error::InvalidPtySize { cols, rows } => {
                write!(
                    f,
                    "Invalid PTY size {}x{}: dimensions must be positive",
                    cols, rows
                )
            }
            Error::StdinClosed => {
                write!(f, "Standard input is closed")
            }
            Error::UnsupportedOperation { operation } => {
                write!(f, "Operation '{}' requires a pseudoterminal", operation)
            }
            Error::PtyResizeFailed { reason } => {
                write!(f, "Failed to resize PTY: {}", reason)
            }
            Error::SignalSendFailed { signal, reason } => {
                write!(f, "Failed to send signal '{}': {}", signal, reason)
            }
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_failed_display() {
        let err = Error::LaunchFailed {
            command: "/no/such/binary".to_string(),
            reason: "No such file or directory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/no/such/binary"));
        assert!(msg.contains("No such file or directory"));
    }

    #[test]
    fn test_unsupported_operation_display() {
        let err = Error::UnsupportedOperation {
            operation: "pty_set_size".to_string(),
        };
        assert!(err.to_string().contains("pty_set_size"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
