//! VISA transport for GPIB/USB/Ethernet instruments.
//!
//! Wraps the `visa-rs` crate and provides async I/O by moving the blocking
//! VISA calls onto Tokio's blocking executor. Supports resource strings
//! like:
//! - `GPIB0::1::INSTR`
//! - `USB0::0x1234::0x5678::SERIAL::INSTR`
//! - `TCPIP0::192.168.1.100::inst0::INSTR`
//!
//! VISA's native read primitive is the query (an atomic write+read), so a
//! trailing-`?` line is held back at [`Transport::write_line`] and issued as
//! one `query` call when the paired [`Transport::read_line`] arrives. The
//! command channel always issues that pair under a single lock, so the
//! deferral is invisible on the wire.

use crate::error::{Result, VnaError};
use crate::transport::Transport;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use visa_rs::{DefaultRM, Instrument, VISA};

/// VISA resource transport.
pub struct VisaTransport {
    resource: String,
    instrument: Option<Arc<Mutex<Box<dyn Instrument>>>>,
    /// A `?`-terminated line waiting for its read half.
    pending_query: Option<String>,
}

fn visa_err(context: &str, err: impl std::fmt::Display) -> VnaError {
    VnaError::Transport(std::io::Error::other(format!("{context}: {err}")))
}

impl VisaTransport {
    /// Open the VISA resource identified by `resource`.
    pub async fn open(resource: &str, timeout: Duration) -> Result<Self> {
        let resource_string = resource.to_string();
        let timeout_ms = timeout.as_millis() as u32;

        let instrument = tokio::task::spawn_blocking(move || {
            let rm = DefaultRM::new()
                .map_err(|e| visa_err("failed to create VISA resource manager", e))?;
            rm.open(&resource_string, timeout_ms, 0)
                .map_err(|e| visa_err("failed to open VISA resource", e))
        })
        .await
        .map_err(|e| visa_err("VISA open task panicked", e))??;

        debug!("VISA resource '{}' opened", resource);
        Ok(Self {
            resource: resource.to_string(),
            instrument: Some(Arc::new(Mutex::new(instrument))),
            pending_query: None,
        })
    }

    fn instrument(&self) -> Result<Arc<Mutex<Box<dyn Instrument>>>> {
        self.instrument.clone().ok_or(VnaError::NotConnected)
    }
}

#[async_trait]
impl Transport for VisaTransport {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        let instrument = self.instrument()?;
        if line.trim_end().ends_with('?') {
            // Issued as a single VISA query when read_line is called.
            self.pending_query = Some(line.to_string());
            return Ok(());
        }
        let command = format!("{line}\n");

        tokio::task::spawn_blocking(move || {
            let mut guard = instrument.blocking_lock();
            guard
                .write(&command)
                .map_err(|e| visa_err("VISA write failed", e))?;
            Ok(())
        })
        .await
        .map_err(|e| visa_err("VISA write task panicked", e))?
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let instrument = self.instrument()?;
        let query = self.pending_query.take().ok_or_else(|| {
            VnaError::Protocol("VISA read without a preceding query".to_string())
        })?;
        let command = format!("{query}\n");
        let timeout_ms = timeout.as_millis() as u32;

        tokio::task::spawn_blocking(move || {
            let mut guard = instrument.blocking_lock();
            guard
                .set_timeout(timeout_ms)
                .map_err(|e| visa_err("failed to set VISA timeout", e))?;
            let response = guard.query(&command).map_err(|_| VnaError::Timeout {
                command: query,
                timeout,
            })?;
            Ok(response.trim_end_matches(['\r', '\n']).to_string())
        })
        .await
        .map_err(|e| visa_err("VISA read task panicked", e))?
    }

    async fn close(&mut self) -> Result<()> {
        if self.instrument.take().is_some() {
            debug!("VISA resource '{}' closed", self.resource);
        }
        self.pending_query = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.instrument.is_some()
    }
}
