//! Two-port calibration through an electronic calibration module.
//!
//! The ECal module self-sequences its internal standards, so the whole
//! procedure is one composite command plus a settle-then-poll completion
//! wait. The settle time comes from configuration because the run scales
//! with port count and sweep settings.

use anyhow::{Context, Result};
use std::sync::Arc;
use vna_control::calibration::{CalibrationEngine, ConsolePrompt};
use vna_control::channel::CommandChannel;
use vna_control::config::Settings;
use vna_control::measurement::{MeasurementSession, SweepConfig};
use vna_control::state::StateStore;
use vna_control::transport::TcpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let settings = Settings::load()?;

    let transport = TcpTransport::connect(&settings.resource)
        .await
        .with_context(|| format!("failed to connect to {}", settings.resource))?;
    let channel = CommandChannel::new(Box::new(transport)).with_timeout(settings.timeout());

    println!("Connected: {}", channel.identify().await?);
    channel.drain_errors().await?;

    StateStore::new(channel.clone()).preset().await?;

    let session = MeasurementSession::new(channel.clone(), settings.channel);
    session
        .configure_sweep(&SweepConfig::center_span(433e6, 20e6, 1001))
        .await?;

    let mut engine = CalibrationEngine::two_port_ecal(
        channel.clone(),
        settings.channel,
        1,
        2,
        Arc::new(ConsolePrompt),
        settings.ecal_settle(),
    )
    .with_step_timeout(settings.timeout());

    engine.run().await.context("ECal run halted")?;
    engine.enable().await?;
    println!("ECal complete; corrections enabled.");

    channel.close().await?;
    Ok(())
}
