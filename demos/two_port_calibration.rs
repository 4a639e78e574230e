//! Two-port manual SOLT calibration driven from the console.
//!
//! Captures all standards on port 1, then port 2, then the thru path in
//! both directions. Corrections are disabled while capturing and re-enabled
//! after the save.

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

    let mut engine = CalibrationEngine::two_port_manual(
        channel.clone(),
        settings.channel,
        1,
        2,
        Arc::new(ConsolePrompt),
    );
    if let Some(kit) = settings.cal_kit {
        engine = engine.with_cal_kit(kit);
    }
    engine.set_correction_state(false).await?;
    engine.set_characteristic_impedance(50.0).await?;

    engine.run().await.context("calibration halted")?;
    engine.enable().await?;
    println!("Two-port calibration saved and corrections enabled.");

    channel.close().await?;
    Ok(())
}
