//! Mock transport for testing.
//!
//! Provides a scripted instrument endpoint without hardware:
//! - queued or sticky responses for reads
//! - a shared write log for verifying the exact command sequence
//! - controllable failure injection
//! - an optional "silent device" mode where reads never complete, for
//!   exercising timeout paths

use crate::error::{Result, VnaError};
use crate::transport::Transport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    responses: VecDeque<String>,
    sticky: Option<String>,
    writes: Vec<String>,
    fail_next: bool,
    pend_when_empty: bool,
    connected: bool,
}

/// Scripted transport double.
///
/// Cloning shares the underlying state, so a test can keep one handle for
/// assertions while the channel owns the other.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a connected mock with an empty response queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                connected: true,
                ..Inner::default()
            })),
        }
    }

    /// Create a connected mock preloaded with responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    /// Queue one response for a future read.
    pub fn push_response<S: Into<String>>(&self, response: S) {
        self.lock().responses.push_back(response.into());
    }

    /// Respond with `response` whenever the queue is empty.
    pub fn respond_always<S: Into<String>>(&self, response: S) {
        self.lock().sticky = Some(response.into());
    }

    /// Never complete a read once the queue is empty (silent device).
    pub fn pend_when_empty(&self) {
        self.lock().pend_when_empty = true;
    }

    /// Fail the next read or write with a transport error.
    pub fn inject_failure(&self) {
        self.lock().fail_next = true;
    }

    /// All command lines written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Forget the recorded writes.
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> bool {
        let mut inner = self.lock();
        std::mem::take(&mut inner.fail_next)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        if self.take_failure() {
            return Err(VnaError::Transport(std::io::Error::other(
                "injected failure",
            )));
        }
        let mut inner = self.lock();
        if !inner.connected {
            return Err(VnaError::NotConnected);
        }
        inner.writes.push(line.to_string());
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<String> {
        if self.take_failure() {
            return Err(VnaError::Transport(std::io::Error::other(
                "injected failure",
            )));
        }
        let pend = {
            let mut inner = self.lock();
            if !inner.connected {
                return Err(VnaError::NotConnected);
            }
            if let Some(response) = inner.responses.pop_front() {
                return Ok(response);
            }
            if let Some(sticky) = inner.sticky.clone() {
                return Ok(sticky);
            }
            inner.pend_when_empty
        };
        if pend {
            // Model a device that never answers; the channel's timeout fires.
            std::future::pending::<()>().await;
        }
        Err(VnaError::Protocol(
            "mock response queue exhausted".to_string(),
        ))
    }

    async fn close(&mut self) -> Result<()> {
        self.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}
