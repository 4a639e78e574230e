//! Remote control and calibration orchestration for SCPI vector network
//! analyzers.
//!
//! The crate drives a stateful bench instrument through multi-step
//! procedures over a half-duplex, line-oriented command bus: error-queue
//! draining, long-running-operation synchronization (`*OPC?`), calibration
//! sequencing with human-in-the-loop gating, sweep and marker configuration,
//! limit testing, and instrument-side state save/recall.
//!
//! ## Architecture
//!
//! All higher-level components issue commands exclusively through a
//! [`channel::CommandChannel`], which owns one [`transport::Transport`] for
//! its lifetime and serializes every write/read pair so that no command is
//! ever issued while a response is outstanding.
//!
//! - [`calibration`]: resumable SOL/SOLT and ECal procedure state machines
//! - [`measurement`]: sweep, trace, and marker configuration and readback
//! - [`limits`]: pass/fail limit-segment tables
//! - [`state`]: save-type flag, store, preset, and recall of named slots
//!
//! Each instrument gets its own channel and component instances; nothing is
//! shared across channels.

pub mod calibration;
pub mod channel;
pub mod config;
pub mod error;
pub mod limits;
pub mod measurement;
pub mod state;
pub mod transport;

pub use channel::{CommandChannel, ErrorEntry};
pub use error::{Result, VnaError};
