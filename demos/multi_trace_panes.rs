//! All four scattering parameters in a 2x2 pane grid.
//!
//! Allocates one log-magnitude trace per S-parameter, lays the panes out in
//! two rows of two, drops markers at a set of frequencies of interest, and
//! reads every marker back on every trace.

use anyhow::{Context, Result};
use vna_control::channel::CommandChannel;
use vna_control::config::Settings;
use vna_control::measurement::{
    Marker, MeasurementSession, PaneLayout, SParameter, SweepConfig, TraceFormat,
};
use vna_control::state::StateStore;
use vna_control::transport::TcpTransport;

const MARKER_FREQS: [f64; 4] = [380e6, 423e6, 876.5e6, 1.8451e9];

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

    let mut session = MeasurementSession::new(channel.clone(), settings.channel);
    session
        .configure_sweep(&SweepConfig::start_stop(350e6, 2.7e9, 1001))
        .await?;

    let parameters = [
        SParameter::S11,
        SParameter::S21,
        SParameter::S12,
        SParameter::S22,
    ];
    for (i, parameter) in parameters.iter().enumerate() {
        session
            .allocate_trace(i as u8 + 1, *parameter, TraceFormat::LogMag)
            .await?;
    }
    session.set_pane_layout(PaneLayout::Quad).await?;

    for (trace, parameter) in parameters.iter().enumerate() {
        session.select_trace(trace as u8 + 1).await?;
        for (m, freq) in MARKER_FREQS.iter().enumerate() {
            let reading = session
                .read_marker_y(&Marker {
                    index: m as u8 + 1,
                    trace: trace as u8 + 1,
                    x_hz: *freq,
                })
                .await?;
            println!(
                "{parameter} @ {:.1} MHz: {:.2} dB",
                freq / 1e6,
                reading.value
            );
        }
    }

    channel.close().await?;
    Ok(())
}
