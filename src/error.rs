//! Custom error types for the library.
//!
//! This module defines the primary error type, [`VnaError`], for the entire
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to distinguish the failure classes that matter when driving
//! a remote instrument:
//!
//! - **`Transport`**: an I/O failure on the underlying connection. Fatal to
//!   the current session; never retried internally.
//! - **`Timeout`**: no response arrived within the budget. The offending
//!   command is carried for diagnosis; the caller decides whether to retry.
//!   After a timeout the channel state is indeterminate until
//!   [`CommandChannel::recover`](crate::channel::CommandChannel::recover)
//!   confirms the instrument is responsive again.
//! - **`Protocol`**: a malformed or unparseable response (error-drain
//!   sentinel never reached, non-numeric marker reply). Fatal to the current
//!   operation and never coerced to a default value.
//! - **`CalibrationStepFailed`**: a specific calibration step's completion
//!   wait failed. The procedure halts at the last good state and can be
//!   resumed by re-running the same step.
//! - **`Precondition`**: API misuse (e.g. querying limit pass before
//!   enabling the test). These are programmer errors, distinguishable from
//!   anything the device reported.
//!
//! Device-reported errors drained from the instrument's queue are *data*,
//! not errors: they travel as `Vec<ErrorEntry>` return values so the caller
//! can inspect them.

use crate::calibration::CalStep;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, VnaError>;

#[derive(Error, Debug)]
pub enum VnaError {
    #[error("transport I/O error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("no response to '{command}' within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("calibration step '{step}' failed: {source}")]
    CalibrationStepFailed {
        step: CalStep,
        #[source]
        source: Box<VnaError>,
    },

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("not connected")]
    NotConnected,

    #[error("connection lost")]
    ConnectionLost,

    #[error("configuration error: {0}")]
    Config(String),
}
