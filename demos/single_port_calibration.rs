//! Single-port SOL calibration driven from the console.
//!
//! Connects to the analyzer, drains stale errors, presets, configures the
//! sweep, then walks the operator through open/short/load captures before
//! saving and enabling the corrections.

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
    let stale = channel.drain_errors().await?;
    if !stale.is_empty() {
        println!("Cleared {} stale error(s) from a prior session.", stale.len());
    }

    StateStore::new(channel.clone()).preset().await?;

    let session = MeasurementSession::new(channel.clone(), settings.channel);
    session
        .configure_sweep(&SweepConfig::center_span(433e6, 20e6, 1001))
        .await?;

    let mut engine = CalibrationEngine::single_port(
        channel.clone(),
        settings.channel,
        1,
        Arc::new(ConsolePrompt),
    );
    if let Some(kit) = settings.cal_kit {
        engine = engine.with_cal_kit(kit);
    }
    engine.run().await.context("calibration halted")?;
    engine.enable().await?;
    println!("Calibration saved and corrections enabled.");

    channel.close().await?;
    Ok(())
}
