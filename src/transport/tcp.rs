//! Raw SCPI over a TCP socket.
//!
//! Most LAN-attached analyzers expose their SCPI parser directly on a
//! socket (conventionally port 5025). Commands are newline-terminated ASCII
//! lines; responses are single lines.

use crate::error::{Result, VnaError};
use crate::transport::Transport;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// TCP socket transport.
pub struct TcpTransport {
    stream: Option<BufReader<TcpStream>>,
    peer: String,
}

impl TcpTransport {
    /// Connect to `addr` (`host:port`).
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        debug!("connected to {}", addr);
        Ok(Self {
            stream: Some(BufReader::new(stream)),
            peer: addr.to_string(),
        })
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<TcpStream>> {
        self.stream.as_mut().ok_or(VnaError::NotConnected)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.stream_mut()?;
        stream.get_mut().write_all(line.as_bytes()).await?;
        stream.get_mut().write_all(b"\n").await?;
        Ok(())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let stream = self.stream_mut()?;
        let mut line = String::new();
        let read = tokio::time::timeout(timeout, stream.read_line(&mut line))
            .await
            .map_err(|_| VnaError::Timeout {
                command: String::new(),
                timeout,
            })??;
        if read == 0 {
            return Err(VnaError::ConnectionLost);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.get_mut().shutdown().await?;
            debug!("closed connection to {}", self.peer);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
