//! Return-loss sweep of a bandpass filter with markers and a limit test.
//!
//! Allocates an S11 log-magnitude trace, reads the response at the band
//! center, target-searches the band edges, then defines an upper limit
//! line over the passband and reports aggregate pass/fail.

use anyhow::{Context, Result};
use vna_control::channel::CommandChannel;
use vna_control::config::Settings;
use vna_control::limits::{LimitSegment, LimitTestController};
use vna_control::measurement::{
    Marker, MarkerAnchor, MeasurementSession, SParameter, SweepConfig, TraceFormat,
};
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

    let mut session = MeasurementSession::new(channel.clone(), settings.channel);
    session
        .configure_sweep(&SweepConfig::center_span(433e6, 20e6, 1601))
        .await?;
    session
        .allocate_trace(1, SParameter::S11, TraceFormat::LogMag)
        .await?;

    // Marker 1 at band center, markers 2 and 3 searched out to the points
    // where the return loss crosses -16.5 dB.
    session.set_marker_anchor(1, MarkerAnchor::Center).await?;
    let center = session
        .read_marker_y(&Marker { index: 1, trace: 1, x_hz: 433e6 })
        .await?;
    println!("Return loss at center: {:.2} dB", center.value);

    for (index, seed) in [(2u8, 423e6), (3u8, 443e6)] {
        let marker = Marker { index, trace: 1, x_hz: seed };
        let edge = session.search_marker(&marker, -16.5).await?;
        let reading = session
            .read_marker_y(&Marker { x_hz: edge, ..marker })
            .await?;
        println!(
            "Marker {index}: -16.5 dB crossing at {:.3} MHz ({:.2} dB)",
            edge / 1e6,
            reading.value
        );
    }

    let mut limits = LimitTestController::new(channel.clone(), settings.channel);
    limits
        .define_segments(&[LimitSegment::upper(428e6, 438e6, -17.0, -17.0)])
        .await?;
    limits.enable(true, true).await?;

    let passed = limits.query_pass().await?;
    println!("Limit test: {}", if passed { "PASS" } else { "FAIL" });

    channel.close().await?;
    Ok(())
}
