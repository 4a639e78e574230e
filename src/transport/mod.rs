//! Transport layer for instrument communication.
//!
//! The [`Transport`] trait abstracts the physical link to the analyzer as a
//! line-oriented, half-duplex channel. Implementations exist for raw SCPI
//! over TCP ([`TcpTransport`]), VISA resources ([`VisaTransport`], behind
//! the `transport_visa` feature), and a scripted mock for testing
//! ([`MockTransport`]).
//!
//! Everything above this layer talks to a
//! [`CommandChannel`](crate::channel::CommandChannel) rather than a
//! transport directly, so the same orchestration code runs against real
//! hardware and deterministic test doubles.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

mod mock;
mod tcp;
#[cfg(feature = "transport_visa")]
mod visa;

pub use mock::MockTransport;
pub use tcp::TcpTransport;
#[cfg(feature = "transport_visa")]
pub use visa::VisaTransport;

/// Line-oriented transport to an instrument.
///
/// Implementations handle framing (newline termination) and connection
/// lifetime. Protocol-level concerns (command vocabulary, error draining,
/// completion polling) live in the command channel that consumes this
/// trait.
#[async_trait]
pub trait Transport: Send {
    /// Write one command line. The implementation appends the newline
    /// terminator.
    async fn write_line(&mut self, line: &str) -> Result<()>;

    /// Read one response line, without its terminator.
    ///
    /// Waits up to `timeout` for the line to arrive. Implementations report
    /// expiry as [`VnaError::Timeout`](crate::VnaError::Timeout); the
    /// channel replaces the command field with the command it issued.
    async fn read_line(&mut self, timeout: Duration) -> Result<String>;

    /// Close the connection. Subsequent reads and writes fail with
    /// [`VnaError::NotConnected`](crate::VnaError::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Whether the transport currently holds a live connection.
    fn is_connected(&self) -> bool;
}
