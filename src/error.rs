//! Custom error types for the library.
//!
//! This module defines the primary error type, `ScanError`, used across the
//! point-cloud codec and the device poller. Using the `thiserror` crate, it
//! provides a centralized and consistent way to handle the different kinds of
//! failures the two subsystems can hit.
//!
//! ## Error taxonomy
//!
//! - **`Io`**: Wraps standard `std::io::Error`, covering all filesystem
//!   failures while reading or writing point-cloud files.
//! - **`DirectoryMissing`**: The writer refuses to write into a directory
//!   that does not exist; creating it is an explicit step for the caller.
//! - **`Format`**: A point-cloud file did not match the expected grammar.
//!   Carries the offending line verbatim so the caller can show it.
//! - **`PortAlreadyOpen`** / **`OpenFailed`**: Device open failures. Neither
//!   is retried automatically; they require a changed configuration or
//!   operator action.
//! - **`Device`**: A non-OK status code reported by the device during
//!   channel configuration.
//! - **`InvalidChannelCount`**: The host handed the controller a channel
//!   list whose length is not exactly [`CHANNEL_COUNT`]. Such a
//!   configuration is never polled.
//!
//! Codec errors are local to a single read/write call and never leave
//! background state dirty. Poller read errors are *not* raised through this
//! type — they are recorded in the shared sample slot as an
//! [`IoStatus`](crate::device::IoStatus) and reconciled on the next
//! evaluation.
//!
//! [`CHANNEL_COUNT`]: crate::device::CHANNEL_COUNT

use crate::device::IoStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors produced by the point-cloud codec and the device poller.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Filesystem I/O failure while reading or writing a point-cloud file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The target directory does not exist. The writer never creates it.
    #[error("directory {0:?} does not exist; create it before writing")]
    DirectoryMissing(PathBuf),

    /// A point-cloud file did not match the expected grammar.
    #[error("malformed point-cloud file: {reason} (line: {line:?})")]
    Format {
        /// The offending line, verbatim.
        line: String,
        /// Why the line was rejected.
        reason: String,
    },

    /// The serial port is already held by another process or session.
    #[error("port {0:?} is already open")]
    PortAlreadyOpen(String),

    /// Opening the device failed for any other reason.
    #[error("failed to open device: {0}")]
    OpenFailed(String),

    /// The device reported a non-OK status during channel configuration.
    #[error("device returned status {0}")]
    Device(IoStatus),

    /// The requested channel list does not have exactly four entries.
    #[error("exactly 4 channel flags required, got {0}")]
    InvalidChannelCount(usize),
}

impl ScanError {
    /// Builds a [`ScanError::Format`] from an offending line and a reason.
    pub fn format(line: impl Into<String>, reason: impl Into<String>) -> Self {
        ScanError::Format {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::format("plx", "first line must be \"ply\"");
        assert!(err.to_string().contains("plx"));
        assert!(err.to_string().contains("first line"));
    }

    #[test]
    fn test_device_error_display() {
        let err = ScanError::Device(IoStatus::ExecError);
        assert_eq!(err.to_string(), "device returned status ERR_EXEC");
    }

    #[test]
    fn test_channel_count_display() {
        let err = ScanError::InvalidChannelCount(3);
        assert_eq!(err.to_string(), "exactly 4 channel flags required, got 3");
    }
}
