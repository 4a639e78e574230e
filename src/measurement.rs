//! Sweep, trace, and marker configuration and readback.
//!
//! A [`MeasurementSession`] configures the frequency axis, binds traces to
//! scattering parameters and display formats, and reads measurement values
//! back through markers. All state it touches lives on the instrument; the
//! session keeps only the trace high-water mark it has allocated, so it can
//! reject marker reads against traces that were never set up.

use crate::channel::CommandChannel;
use crate::error::{Result, VnaError};
use log::info;
use std::fmt;
use std::time::Duration;

/// Scattering parameter measured by a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SParameter {
    S11,
    S21,
    S12,
    S22,
}

impl SParameter {
    fn mnemonic(self) -> &'static str {
        match self {
            SParameter::S11 => "S11",
            SParameter::S21 => "S21",
            SParameter::S12 => "S12",
            SParameter::S22 => "S22",
        }
    }
}

/// Display format of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// Log magnitude (dB).
    LogMag,
    /// Linear magnitude.
    LinMag,
    /// Standing wave ratio.
    Swr,
    /// Phase (degrees).
    Phase,
    /// Smith chart.
    Smith,
    /// Group delay.
    GroupDelay,
}

impl TraceFormat {
    fn mnemonic(self) -> &'static str {
        match self {
            TraceFormat::LogMag => "MLOG",
            TraceFormat::LinMag => "MLIN",
            TraceFormat::Swr => "SWR",
            TraceFormat::Phase => "PHAS",
            TraceFormat::Smith => "SMIT",
            TraceFormat::GroupDelay => "GDEL",
        }
    }
}

/// Frequency axis, framed either around a center or between two edges.
/// The two framings are mutually exclusive: one configuration sends one
/// pair of commands, never a mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyRange {
    CenterSpan { center_hz: f64, span_hz: f64 },
    StartStop { start_hz: f64, stop_hz: f64 },
}

/// Validated sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    pub range: FrequencyRange,
    pub points: u32,
}

impl SweepConfig {
    pub fn center_span(center_hz: f64, span_hz: f64, points: u32) -> Self {
        Self {
            range: FrequencyRange::CenterSpan { center_hz, span_hz },
            points,
        }
    }

    pub fn start_stop(start_hz: f64, stop_hz: f64, points: u32) -> Self {
        Self {
            range: FrequencyRange::StartStop { start_hz, stop_hz },
            points,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.points < 1 {
            return Err(VnaError::Precondition(
                "sweep must contain at least one point".to_string(),
            ));
        }
        match self.range {
            FrequencyRange::CenterSpan { span_hz, .. } if span_hz <= 0.0 => {
                Err(VnaError::Precondition(format!(
                    "sweep span must be positive, got {span_hz} Hz"
                )))
            }
            FrequencyRange::StartStop { start_hz, stop_hz } if start_hz >= stop_hz => {
                Err(VnaError::Precondition(format!(
                    "sweep start must be below stop, got {start_hz}..{stop_hz} Hz"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// A measurement view bound to a parameter and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    pub index: u8,
    pub parameter: SParameter,
    pub format: TraceFormat,
}

/// A cursor on a trace's frequency axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub index: u8,
    pub trace: u8,
    pub x_hz: f64,
}

/// Marker readback: the primary response value plus the secondary value,
/// which the instrument reports as zero outside Smith and polar formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerReading {
    pub value: f64,
    pub secondary: f64,
}

/// Result of a marker bandwidth search, as reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthData {
    pub bandwidth: f64,
    pub center: f64,
    pub min: f64,
    pub max: f64,
    pub q: f64,
    pub loss: f64,
}

/// Quick marker positions that need no explicit frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAnchor {
    Start,
    Stop,
    Center,
    Span,
    RefLevel,
    Delay,
    RefMarker,
}

impl MarkerAnchor {
    fn mnemonic(self) -> &'static str {
        match self {
            MarkerAnchor::Start => "STAR",
            MarkerAnchor::Stop => "STOP",
            MarkerAnchor::Center => "CENT",
            MarkerAnchor::Span => "SPAN",
            MarkerAnchor::RefLevel => "RLEV",
            MarkerAnchor::Delay => "DEL",
            MarkerAnchor::RefMarker => "RMAR",
        }
    }
}

/// Sweep trigger source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Internal,
    External,
    Manual,
    Bus,
}

impl TriggerSource {
    fn mnemonic(self) -> &'static str {
        match self {
            TriggerSource::Internal => "INT",
            TriggerSource::External => "EXT",
            TriggerSource::Manual => "MAN",
            TriggerSource::Bus => "BUS",
        }
    }
}

/// Display pane arrangement for one channel window. Grouped digits share a
/// row; an underscore starts a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneLayout {
    Single,
    SideBySide,
    Stacked,
    TripleAcross,
    TripleStacked,
    Quad,
}

impl PaneLayout {
    fn mnemonic(self) -> &'static str {
        match self {
            PaneLayout::Single => "D1",
            PaneLayout::SideBySide => "D12",
            PaneLayout::Stacked => "D1_2",
            PaneLayout::TripleAcross => "D123",
            PaneLayout::TripleStacked => "D1_2_3",
            PaneLayout::Quad => "D12_34",
        }
    }
}

impl fmt::Display for SParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

fn parse_number(reply: &str, what: &str) -> Result<f64> {
    reply.trim().parse::<f64>().map_err(|_| {
        VnaError::Protocol(format!("non-numeric {what} reply: '{reply}'"))
    })
}

/// Measurement configuration and marker readback for one channel.
pub struct MeasurementSession {
    channel: CommandChannel,
    channel_no: u8,
    trace_count: u8,
}

impl MeasurementSession {
    pub fn new(channel: CommandChannel, channel_no: u8) -> Self {
        Self {
            channel,
            channel_no,
            trace_count: 0,
        }
    }

    /// Configure the frequency axis and point count.
    ///
    /// Validation happens before any command is written: an invalid
    /// configuration leaves the instrument untouched.
    pub async fn configure_sweep(&self, config: &SweepConfig) -> Result<()> {
        config.validate()?;
        let c = self.channel_no;
        match config.range {
            FrequencyRange::CenterSpan { center_hz, span_hz } => {
                self.channel
                    .send(&format!(":SENS{c}:FREQ:CENT {center_hz}"))
                    .await?;
                self.channel
                    .send(&format!(":SENS{c}:FREQ:SPAN {span_hz}"))
                    .await?;
            }
            FrequencyRange::StartStop { start_hz, stop_hz } => {
                self.channel
                    .send(&format!(":SENS{c}:FREQ:STAR {start_hz}"))
                    .await?;
                self.channel
                    .send(&format!(":SENS{c}:FREQ:STOP {stop_hz}"))
                    .await?;
            }
        }
        self.channel
            .send(&format!(":SENS{c}:SWE:POIN {}", config.points))
            .await?;
        info!("sweep configured: {:?}", config);
        Ok(())
    }

    /// Allocate (or re-select) trace `index`, bind it to a parameter and
    /// format, and autoscale it.
    ///
    /// The channel's trace count is raised only when `index` exceeds it, so
    /// re-allocating an existing index is idempotent. The new trace becomes
    /// the selected one; selection is a transient focus pointer, not
    /// ownership.
    pub async fn allocate_trace(
        &mut self,
        index: u8,
        parameter: SParameter,
        format: TraceFormat,
    ) -> Result<Trace> {
        if index < 1 {
            return Err(VnaError::Precondition(
                "trace indices are 1-based".to_string(),
            ));
        }
        let c = self.channel_no;
        let reply = self.channel.query(&format!(":CALC{c}:PAR:COUN?")).await?;
        let current = reply.trim().parse::<u8>().map_err(|_| {
            VnaError::Protocol(format!("non-numeric trace count reply: '{reply}'"))
        })?;
        if index > current {
            self.channel
                .send(&format!(":CALC{c}:PAR:COUN {index}"))
                .await?;
        }
        self.channel.send(&format!(":CALC{c}:PAR{index}:SEL")).await?;
        self.channel
            .send(&format!(":CALC{c}:PAR{index}:DEF {}", parameter.mnemonic()))
            .await?;
        self.channel
            .send(&format!(":CALC{c}:TRAC{index}:FORM {}", format.mnemonic()))
            .await?;
        self.autoscale(index).await?;

        self.trace_count = self.trace_count.max(index).max(current);
        Ok(Trace {
            index,
            parameter,
            format,
        })
    }

    /// Move the focus pointer to an already-allocated trace.
    pub async fn select_trace(&self, index: u8) -> Result<()> {
        self.require_trace(index)?;
        self.channel
            .send(&format!(":CALC{}:PAR{index}:SEL", self.channel_no))
            .await
    }

    /// Position the marker and read its response value.
    ///
    /// The marker's trace must have been allocated through this session.
    /// A disabled marker is enabled first (visibility is checked before
    /// the move) and the marker is then positioned at its `x_hz` before
    /// the value query. A non-numeric reply is a protocol error, never
    /// coerced.
    pub async fn read_marker_y(&self, marker: &Marker) -> Result<MarkerReading> {
        self.require_trace(marker.trace)?;
        let c = self.channel_no;
        let m = marker.index;
        self.ensure_marker_visible(m).await?;
        self.channel
            .send(&format!(":CALC{c}:MARK{m}:X {}", marker.x_hz))
            .await?;
        let reply = self.channel.query(&format!(":CALC{c}:MARK{m}:Y?")).await?;
        let (value, secondary) = reply.split_once(',').unwrap_or((reply.as_str(), "0"));
        Ok(MarkerReading {
            value: parse_number(value, "marker Y")?,
            secondary: parse_number(secondary, "marker Y")?,
        })
    }

    /// Snap the marker to a stimulus anchor (center, start, ...).
    pub async fn set_marker_anchor(&self, marker: u8, anchor: MarkerAnchor) -> Result<()> {
        self.ensure_marker_visible(marker).await?;
        self.channel
            .send(&format!(
                ":CALC{}:MARK{marker}:SET {}",
                self.channel_no,
                anchor.mnemonic()
            ))
            .await
    }

    /// Run a target-value search from the marker's current position and
    /// return the stimulus it landed on.
    ///
    /// Which crossing wins when several points match is instrument-defined;
    /// the session reports the result without second-guessing it. The
    /// returned position is only meaningful after the execute completes.
    pub async fn search_marker(&self, marker: &Marker, target: f64) -> Result<f64> {
        self.require_trace(marker.trace)?;
        let c = self.channel_no;
        let m = marker.index;
        self.ensure_marker_visible(m).await?;
        self.channel
            .send(&format!(":CALC{c}:MARK{m}:X {}", marker.x_hz))
            .await?;
        self.channel
            .send(&format!(":CALC{c}:MARK{m}:FUNC:TYPE TARG"))
            .await?;
        self.channel
            .send(&format!(":CALC{c}:MARK{m}:FUNC:TARG {target}"))
            .await?;
        self.channel
            .send(&format!(":CALC{c}:MARK{m}:FUNC:EXEC"))
            .await?;
        let reply = self.channel.query(&format!(":CALC{c}:MARK{m}:X?")).await?;
        parse_number(&reply, "marker X")
    }

    /// Bandwidth search around the marker, against the given threshold.
    pub async fn bandwidth_search(&self, marker: u8, threshold: f64) -> Result<BandwidthData> {
        let c = self.channel_no;
        self.channel.send(&format!(":CALC{c}:MARK:BWID 1")).await?;
        self.channel
            .send(&format!(":CALC{c}:MARK{marker}:BWID:THR {threshold}"))
            .await?;
        let reply = self
            .channel
            .query(&format!(":CALC{c}:MARK{marker}:BWID:DATA?"))
            .await?;
        let fields: Vec<&str> = reply.split(',').collect();
        if fields.len() != 6 {
            return Err(VnaError::Protocol(format!(
                "bandwidth search reply should carry six values: '{reply}'"
            )));
        }
        Ok(BandwidthData {
            bandwidth: parse_number(fields[0], "bandwidth")?,
            center: parse_number(fields[1], "bandwidth")?,
            min: parse_number(fields[2], "bandwidth")?,
            max: parse_number(fields[3], "bandwidth")?,
            q: parse_number(fields[4], "bandwidth")?,
            loss: parse_number(fields[5], "bandwidth")?,
        })
    }

    /// Halt continuous sweeping; the channel waits for explicit triggers.
    pub async fn hold_sweep(&self) -> Result<()> {
        self.channel
            .send(&format!(":INIT{}:CONT 0", self.channel_no))
            .await
    }

    /// Resume continuous sweeping.
    pub async fn resume_continuous(&self) -> Result<()> {
        self.channel
            .send(&format!(":INIT{}:CONT 1", self.channel_no))
            .await
    }

    /// Select the sweep trigger source.
    pub async fn set_trigger_source(&self, source: TriggerSource) -> Result<()> {
        self.channel
            .send(&format!(":TRIG:SOUR {}", source.mnemonic()))
            .await
    }

    /// Fire one trigger and block until the resulting sweep completes.
    pub async fn trigger_and_wait(&self, timeout: Duration) -> Result<()> {
        self.channel.send(":TRIG").await?;
        self.channel
            .wait_for_completion(Duration::ZERO, timeout)
            .await
    }

    /// Autoscale the Y axis of one trace.
    pub async fn autoscale(&self, trace: u8) -> Result<()> {
        self.channel
            .send(&format!(
                ":DISP:WIND{}:TRAC{trace}:Y:AUTO",
                self.channel_no
            ))
            .await
    }

    /// Maximize or restore the channel window.
    pub async fn maximize_window(&self, on: bool) -> Result<()> {
        self.channel
            .send(&format!(":DISP:WIND{}:MAX {}", self.channel_no, u8::from(on)))
            .await
    }

    /// Arrange the channel window's trace panes.
    pub async fn set_pane_layout(&self, layout: PaneLayout) -> Result<()> {
        self.channel
            .send(&format!(
                ":DISP:WIND{}:SPL {}",
                self.channel_no,
                layout.mnemonic()
            ))
            .await
    }

    fn require_trace(&self, index: u8) -> Result<()> {
        if index < 1 || index > self.trace_count {
            return Err(VnaError::Precondition(format!(
                "trace {index} has not been allocated (session holds {})",
                self.trace_count
            )));
        }
        Ok(())
    }

    async fn ensure_marker_visible(&self, marker: u8) -> Result<()> {
        let c = self.channel_no;
        let state = self.channel.query(&format!(":CALC{c}:MARK{marker}?")).await?;
        if state.trim() != "1" {
            self.channel
                .send(&format!(":CALC{c}:MARK{marker} 1"))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn session_over(mock: &MockTransport) -> MeasurementSession {
        MeasurementSession::new(CommandChannel::new(Box::new(mock.clone())), 1)
    }

    #[test]
    fn test_sweep_validation() {
        assert!(SweepConfig::center_span(433e6, 20e6, 1001).validate().is_ok());
        assert!(SweepConfig::start_stop(800e6, 925e6, 1001).validate().is_ok());

        assert!(SweepConfig::center_span(433e6, 0.0, 1001).validate().is_err());
        assert!(SweepConfig::center_span(433e6, -1.0, 1001).validate().is_err());
        assert!(SweepConfig::start_stop(925e6, 800e6, 1001).validate().is_err());
        assert!(SweepConfig::start_stop(800e6, 800e6, 1001).validate().is_err());
        assert!(SweepConfig::center_span(433e6, 20e6, 0).validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_sweep_sends_nothing() {
        let mock = MockTransport::new();
        let session = session_over(&mock);

        let err = session
            .configure_sweep(&SweepConfig::start_stop(925e6, 800e6, 1001))
            .await;
        assert!(matches!(err, Err(VnaError::Precondition(_))));
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_center_span_sweep_commands() {
        let mock = MockTransport::new();
        let session = session_over(&mock);

        session
            .configure_sweep(&SweepConfig::center_span(433e6, 20e6, 1001))
            .await
            .unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                ":SENS1:FREQ:CENT 433000000",
                ":SENS1:FREQ:SPAN 20000000",
                ":SENS1:SWE:POIN 1001",
            ]
        );
    }

    #[tokio::test]
    async fn test_start_stop_sweep_commands() {
        let mock = MockTransport::new();
        let session = session_over(&mock);

        session
            .configure_sweep(&SweepConfig::start_stop(800e6, 925e6, 1001))
            .await
            .unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                ":SENS1:FREQ:STAR 800000000",
                ":SENS1:FREQ:STOP 925000000",
                ":SENS1:SWE:POIN 1001",
            ]
        );
    }

    #[tokio::test]
    async fn test_allocate_trace_raises_count_and_selects() {
        let mock = MockTransport::with_responses(["1"]);
        let mut session = session_over(&mock);

        let trace = session
            .allocate_trace(2, SParameter::S11, TraceFormat::Swr)
            .await
            .unwrap();
        assert_eq!(trace.index, 2);
        assert_eq!(
            mock.writes(),
            vec![
                ":CALC1:PAR:COUN?",
                ":CALC1:PAR:COUN 2",
                ":CALC1:PAR2:SEL",
                ":CALC1:PAR2:DEF S11",
                ":CALC1:TRAC2:FORM SWR",
                ":DISP:WIND1:TRAC2:Y:AUTO",
            ]
        );
    }

    #[tokio::test]
    async fn test_allocate_existing_trace_keeps_count() {
        let mock = MockTransport::with_responses(["2"]);
        let mut session = session_over(&mock);

        session
            .allocate_trace(1, SParameter::S21, TraceFormat::LogMag)
            .await
            .unwrap();
        let writes = mock.writes();
        assert!(!writes.iter().any(|w| w.starts_with(":CALC1:PAR:COUN ")));
        assert!(writes.contains(&":CALC1:PAR1:SEL".to_string()));
    }

    #[tokio::test]
    async fn test_read_marker_y_enables_then_moves_then_queries() {
        let mock = MockTransport::with_responses(["2", "0", "-1.65E+01,0"]);
        let mut session = session_over(&mock);
        session
            .allocate_trace(1, SParameter::S11, TraceFormat::LogMag)
            .await
            .unwrap();
        mock.clear_writes();

        let marker = Marker {
            index: 1,
            trace: 1,
            x_hz: 433e6,
        };
        let reading = session.read_marker_y(&marker).await.unwrap();
        assert_eq!(reading.value, -16.5);
        assert_eq!(reading.secondary, 0.0);
        assert_eq!(
            mock.writes(),
            vec![
                ":CALC1:MARK1?",
                ":CALC1:MARK1 1",
                ":CALC1:MARK1:X 433000000",
                ":CALC1:MARK1:Y?",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_marker_y_skips_enable_when_visible() {
        let mock = MockTransport::with_responses(["1", "1", "-3.5,0"]);
        let mut session = session_over(&mock);
        session
            .allocate_trace(1, SParameter::S11, TraceFormat::LogMag)
            .await
            .unwrap();
        mock.clear_writes();

        let marker = Marker {
            index: 1,
            trace: 1,
            x_hz: 433e6,
        };
        session.read_marker_y(&marker).await.unwrap();
        assert!(!mock.writes().contains(&":CALC1:MARK1 1".to_string()));
    }

    #[tokio::test]
    async fn test_read_marker_y_requires_allocated_trace() {
        let mock = MockTransport::new();
        let session = session_over(&mock);

        let marker = Marker {
            index: 1,
            trace: 1,
            x_hz: 433e6,
        };
        assert!(matches!(
            session.read_marker_y(&marker).await,
            Err(VnaError::Precondition(_))
        ));
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_read_marker_y_rejects_non_numeric_reply() {
        let mock = MockTransport::with_responses(["1", "1", "OVERLOAD"]);
        let mut session = session_over(&mock);
        session
            .allocate_trace(1, SParameter::S11, TraceFormat::LogMag)
            .await
            .unwrap();

        let marker = Marker {
            index: 1,
            trace: 1,
            x_hz: 433e6,
        };
        assert!(matches!(
            session.read_marker_y(&marker).await,
            Err(VnaError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_search_marker_command_sequence() {
        let mock = MockTransport::with_responses(["1", "1", "4.28E+08"]);
        let mut session = session_over(&mock);
        session
            .allocate_trace(1, SParameter::S11, TraceFormat::LogMag)
            .await
            .unwrap();
        mock.clear_writes();

        let marker = Marker {
            index: 2,
            trace: 1,
            x_hz: 423e6,
        };
        let x = session.search_marker(&marker, -16.5).await.unwrap();
        assert_eq!(x, 4.28e8);
        assert_eq!(
            mock.writes(),
            vec![
                ":CALC1:MARK2?",
                ":CALC1:MARK2:X 423000000",
                ":CALC1:MARK2:FUNC:TYPE TARG",
                ":CALC1:MARK2:FUNC:TARG -16.5",
                ":CALC1:MARK2:FUNC:EXEC",
                ":CALC1:MARK2:X?",
            ]
        );
    }

    #[tokio::test]
    async fn test_bandwidth_search_parses_six_fields() {
        let mock =
            MockTransport::with_responses(["1.2E+07,4.33E+08,4.27E+08,4.39E+08,36.1,-2.5"]);
        let session = session_over(&mock);

        let data = session.bandwidth_search(1, -3.0).await.unwrap();
        assert_eq!(data.bandwidth, 1.2e7);
        assert_eq!(data.center, 4.33e8);
        assert_eq!(data.q, 36.1);
        assert_eq!(data.loss, -2.5);
    }

    #[tokio::test]
    async fn test_bandwidth_search_rejects_short_reply() {
        let mock = MockTransport::with_responses(["1.2E+07,4.33E+08"]);
        let session = session_over(&mock);
        assert!(matches!(
            session.bandwidth_search(1, -3.0).await,
            Err(VnaError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_trigger_and_wait_reuses_completion_poll() {
        let mock = MockTransport::with_responses(["1"]);
        let session = session_over(&mock);

        session.hold_sweep().await.unwrap();
        session.set_trigger_source(TriggerSource::Bus).await.unwrap();
        session
            .trigger_and_wait(Duration::from_secs(1))
            .await
            .unwrap();
        session.resume_continuous().await.unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                ":INIT1:CONT 0",
                ":TRIG:SOUR BUS",
                ":TRIG",
                "*OPC?",
                ":INIT1:CONT 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_marker_anchor_enables_then_snaps() {
        let mock = MockTransport::with_responses(["0"]);
        let session = session_over(&mock);

        session
            .set_marker_anchor(1, MarkerAnchor::Center)
            .await
            .unwrap();
        assert_eq!(
            mock.writes(),
            vec![":CALC1:MARK1?", ":CALC1:MARK1 1", ":CALC1:MARK1:SET CENT"]
        );
    }

    #[tokio::test]
    async fn test_select_trace_requires_allocation() {
        let mock = MockTransport::with_responses(["1"]);
        let mut session = session_over(&mock);
        session
            .allocate_trace(1, SParameter::S11, TraceFormat::LogMag)
            .await
            .unwrap();

        session.select_trace(1).await.unwrap();
        assert!(matches!(
            session.select_trace(2).await,
            Err(VnaError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn test_display_layout_commands() {
        let mock = MockTransport::new();
        let session = session_over(&mock);

        session.maximize_window(true).await.unwrap();
        session.set_pane_layout(PaneLayout::Stacked).await.unwrap();
        assert_eq!(
            mock.writes(),
            vec![":DISP:WIND1:MAX 1", ":DISP:WIND1:SPL D1_2"]
        );
    }
}
