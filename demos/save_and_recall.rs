//! Save the instrument setup to a named slot, preset, and recall it.
//!
//! The preset between store and load is the point of the exercise: it
//! wipes the live configuration, and the recall proves the slot carries
//! everything back, calibration included.

use anyhow::{Context, Result};
use vna_control::channel::CommandChannel;
use vna_control::config::Settings;
use vna_control::measurement::{MeasurementSession, SParameter, SweepConfig, TraceFormat};
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

    let store = StateStore::new(channel.clone());
    store.preset().await?;
    channel
        .wait_for_completion(std::time::Duration::ZERO, settings.timeout())
        .await?;

    let mut session = MeasurementSession::new(channel.clone(), settings.channel);
    session
        .configure_sweep(&SweepConfig::center_span(433e6, 20e6, 1601))
        .await?;
    session
        .allocate_trace(1, SParameter::S21, TraceFormat::LogMag)
        .await?;

    store.save("mystate", true).await?;
    println!("Setup stored to 'mystate'.");

    store.preset().await?;
    println!("Preset applied; live setup discarded.");

    let errors = store.recall("mystate").await?;
    if errors.is_empty() {
        println!("Setup recalled.");
    } else {
        for error in &errors {
            eprintln!("recall error {}: {}", error.code, error.message);
        }
    }

    channel.close().await?;
    Ok(())
}
