//! Command channel: atomic query/command primitives over one transport.
//!
//! The channel owns a single live [`Transport`] for its lifetime and is the
//! only component that touches it. Every write/read pair runs under one
//! mutex acquisition, so no command is issued while a prior response is
//! outstanding: the bus is half-duplex and the instrument is itself a
//! single-threaded state machine. Concurrent callers are serialized, not
//! rejected.
//!
//! The two poll-until-sentinel protocols live here and are reused by every
//! higher component: error-queue draining ([`CommandChannel::drain_errors`])
//! and operation-complete synchronization
//! ([`CommandChannel::wait_for_completion`]).

use crate::error::{Result, VnaError};
use crate::transport::Transport;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Upper bound on error-queue reads in one drain.
///
/// A real instrument never queues anywhere near this many entries, so
/// exceeding the cap indicates a parsing or device fault rather than a
/// legitimate backlog.
pub const ERROR_DRAIN_CAP: usize = 64;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One entry from the instrument's FIFO error queue.
///
/// Code `0` is the "queue empty" sentinel and never a real error. Drained
/// entries are data for the caller to inspect, not control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: i32,
    pub message: String,
}

impl ErrorEntry {
    fn parse(reply: &str) -> Result<Self> {
        let (code, message) = reply.split_once(',').unwrap_or((reply, ""));
        let code = code.trim().parse::<i32>().map_err(|_| {
            VnaError::Protocol(format!("malformed error-queue reply: '{reply}'"))
        })?;
        Ok(Self {
            code,
            message: message.trim().trim_matches('"').to_string(),
        })
    }
}

/// Serialized command/query access to one instrument.
///
/// Cloning is cheap and shares the underlying transport and its lock; use a
/// clone per component (calibration engine, measurement session, ...) of the
/// same instrument. Separate instruments get separate channels; nothing is
/// shared across them.
#[derive(Clone)]
pub struct CommandChannel {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    timeout: Duration,
}

impl CommandChannel {
    /// Wrap a transport with the default 5 s query timeout.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the default query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The default query timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Write a command with no response expected.
    pub async fn send(&self, command: &str) -> Result<()> {
        let mut transport = self.transport.lock().await;
        debug!("-> {}", command);
        transport.write_line(command).await
    }

    /// Write a query and block for exactly one response line.
    pub async fn query(&self, command: &str) -> Result<String> {
        self.query_with_timeout(command, self.timeout).await
    }

    /// Write a query and block up to `timeout` for the response line.
    ///
    /// On timeout the channel state is indeterminate: the instrument may
    /// still produce the response later, and a stale line would be misread
    /// as the answer to the next query. Do not start a different procedure
    /// on this channel until [`recover`](Self::recover) succeeds.
    pub async fn query_with_timeout(&self, command: &str, timeout: Duration) -> Result<String> {
        // The lock spans write and read: the response slot stays owned by
        // this query until the line arrives or the budget expires.
        let mut transport = self.transport.lock().await;
        debug!("-> {}", command);
        transport.write_line(command).await?;

        let reply = match tokio::time::timeout(timeout, transport.read_line(timeout)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(VnaError::Timeout { .. })) | Err(_) => {
                return Err(VnaError::Timeout {
                    command: command.to_string(),
                    timeout,
                })
            }
            Ok(Err(e)) => return Err(e),
        };
        let reply = reply.trim().to_string();
        debug!("<- {}", reply);
        Ok(reply)
    }

    /// Drain the instrument's error queue until the code-0 sentinel.
    ///
    /// Returns every real entry seen, in FIFO order. Call this at session
    /// start (the instrument may carry stale errors from a prior client)
    /// and after any configuration burst. If the sentinel is not reached
    /// within [`ERROR_DRAIN_CAP`] reads the drain fails with a protocol
    /// error rather than looping forever.
    pub async fn drain_errors(&self) -> Result<Vec<ErrorEntry>> {
        let mut entries = Vec::new();
        for _ in 0..ERROR_DRAIN_CAP {
            let reply = self.query(":SYST:ERR?").await?;
            let entry = ErrorEntry::parse(&reply)?;
            if entry.code == 0 {
                return Ok(entries);
            }
            warn!("instrument error {}: {}", entry.code, entry.message);
            entries.push(entry);
        }
        Err(VnaError::Protocol(format!(
            "error queue not exhausted after {ERROR_DRAIN_CAP} reads"
        )))
    }

    /// Block until all pending operations complete, or `timeout` elapses.
    ///
    /// Some long-running operations (multi-second calibration sweeps, ECal
    /// runs) need a settle delay before the instrument is ready to answer
    /// `*OPC?` at all; the required duration is operation-dependent, so the
    /// caller supplies it. Pass [`Duration::ZERO`] when no settle is needed.
    pub async fn wait_for_completion(&self, settle: Duration, timeout: Duration) -> Result<()> {
        if !settle.is_zero() {
            debug!("settling {:?} before completion poll", settle);
            tokio::time::sleep(settle).await;
        }
        let reply = self.query_with_timeout("*OPC?", timeout).await?;
        if reply.trim_start_matches('+') == "1" {
            Ok(())
        } else {
            Err(VnaError::Protocol(format!(
                "unexpected *OPC? reply: '{reply}'"
            )))
        }
    }

    /// Query the instrument identity (`*IDN?`).
    pub async fn identify(&self) -> Result<String> {
        self.query("*IDN?").await
    }

    /// Resynchronize after a timeout left the channel indeterminate.
    ///
    /// Confirms the instrument is responsive with an identity query, then
    /// drains the error queue; returns whatever the queue held. Until this
    /// succeeds the channel must not be reused for a different procedure.
    pub async fn recover(&self) -> Result<Vec<ErrorEntry>> {
        let identity = self.identify().await?;
        debug!("channel responsive: {}", identity);
        self.drain_errors().await
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<()> {
        self.transport.lock().await.close().await
    }
}
