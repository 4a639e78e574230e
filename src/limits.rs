//! Pass/fail limit testing over a trace.
//!
//! The controller owns the instrument's limit-line table for one channel:
//! each (re)definition clears the previous table before writing the new
//! segments, so from the caller's perspective the swap is atomic. Segment
//! order matters only for display and indexing; the instrument evaluates
//! every segment against the full trace independently.

use crate::channel::CommandChannel;
use crate::error::{Result, VnaError};
use log::info;

/// Which side of the trace a segment bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Upper,
    Lower,
}

impl LimitKind {
    fn wire_code(self) -> u8 {
        match self {
            LimitKind::Upper => 1,
            LimitKind::Lower => 2,
        }
    }
}

/// One limit line over a frequency interval, with linearly interpolated
/// levels between its endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitSegment {
    pub kind: LimitKind,
    pub start_hz: f64,
    pub stop_hz: f64,
    pub start_level: f64,
    pub stop_level: f64,
}

impl LimitSegment {
    pub fn upper(start_hz: f64, stop_hz: f64, start_level: f64, stop_level: f64) -> Self {
        Self {
            kind: LimitKind::Upper,
            start_hz,
            stop_hz,
            start_level,
            stop_level,
        }
    }

    pub fn lower(start_hz: f64, stop_hz: f64, start_level: f64, stop_level: f64) -> Self {
        Self {
            kind: LimitKind::Lower,
            start_hz,
            stop_hz,
            start_level,
            stop_level,
        }
    }
}

/// Limit table definition and pass/fail readback for one channel.
pub struct LimitTestController {
    channel: CommandChannel,
    channel_no: u8,
    enabled: bool,
}

impl LimitTestController {
    pub fn new(channel: CommandChannel, channel_no: u8) -> Self {
        Self {
            channel,
            channel_no,
            enabled: false,
        }
    }

    /// Replace the limit table: clear, then define each segment with its
    /// 1-based sequence index.
    pub async fn define_segments(&self, segments: &[LimitSegment]) -> Result<()> {
        let c = self.channel_no;
        self.channel.send(&format!(":CALC{c}:LIM:DATA 0")).await?;
        for (i, segment) in segments.iter().enumerate() {
            self.channel
                .send(&format!(
                    ":CALC{c}:LIM:DATA {},{},{},{},{},{}",
                    i + 1,
                    segment.kind.wire_code(),
                    segment.start_hz,
                    segment.stop_hz,
                    segment.start_level,
                    segment.stop_level,
                ))
                .await?;
        }
        info!("limit table defined with {} segment(s)", segments.len());
        Ok(())
    }

    /// Turn limit evaluation on, with the visual indicators set as asked.
    /// The three knobs stay independently adjustable afterwards via
    /// [`show_line`](Self::show_line) and
    /// [`show_fail_sign`](Self::show_fail_sign).
    pub async fn enable(&mut self, show_line: bool, show_fail_sign: bool) -> Result<()> {
        self.channel
            .send(&format!(":CALC{}:LIM 1", self.channel_no))
            .await?;
        self.show_line(show_line).await?;
        self.show_fail_sign(show_fail_sign).await?;
        self.enabled = true;
        Ok(())
    }

    /// Turn limit evaluation off.
    pub async fn disable(&mut self) -> Result<()> {
        self.channel
            .send(&format!(":CALC{}:LIM 0", self.channel_no))
            .await?;
        self.enabled = false;
        Ok(())
    }

    /// Show or hide the limit lines on the display.
    pub async fn show_line(&self, on: bool) -> Result<()> {
        self.channel
            .send(&format!(":CALC{}:LIM:DISP {}", self.channel_no, u8::from(on)))
            .await
    }

    /// Show or hide the large fail indicator.
    pub async fn show_fail_sign(&self, on: bool) -> Result<()> {
        self.channel
            .send(&format!(":DISP:FSIG {}", u8::from(on)))
            .await
    }

    /// Aggregate pass/fail over all segments.
    ///
    /// Only meaningful while limit evaluation is on; calling this before
    /// [`enable`](Self::enable) is an API misuse and sends nothing.
    pub async fn query_pass(&self) -> Result<bool> {
        if !self.enabled {
            return Err(VnaError::Precondition(
                "limit test has not been enabled".to_string(),
            ));
        }
        let reply = self
            .channel
            .query(&format!(":CALC{}:LIM:FAIL?", self.channel_no))
            .await?;
        match reply.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(VnaError::Protocol(format!(
                "unexpected limit test reply: '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn controller_over(mock: &MockTransport) -> LimitTestController {
        LimitTestController::new(CommandChannel::new(Box::new(mock.clone())), 1)
    }

    #[tokio::test]
    async fn test_define_clears_then_indexes_from_one() {
        let mock = MockTransport::new();
        let controller = controller_over(&mock);

        controller
            .define_segments(&[
                LimitSegment::upper(428e6, 438e6, -17.0, -17.0),
                LimitSegment::lower(428e6, 438e6, -40.0, -40.0),
            ])
            .await
            .unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                ":CALC1:LIM:DATA 0",
                ":CALC1:LIM:DATA 1,1,428000000,438000000,-17,-17",
                ":CALC1:LIM:DATA 2,2,428000000,438000000,-40,-40",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_table_still_clears() {
        let mock = MockTransport::new();
        let controller = controller_over(&mock);
        controller.define_segments(&[]).await.unwrap();
        assert_eq!(mock.writes(), vec![":CALC1:LIM:DATA 0"]);
    }

    #[tokio::test]
    async fn test_enable_sets_all_three_knobs() {
        let mock = MockTransport::new();
        let mut controller = controller_over(&mock);

        controller.enable(true, false).await.unwrap();
        assert_eq!(
            mock.writes(),
            vec![":CALC1:LIM 1", ":CALC1:LIM:DISP 1", ":DISP:FSIG 0"]
        );
    }

    #[tokio::test]
    async fn test_query_pass_before_enable_is_precondition() {
        let mock = MockTransport::new();
        let controller = controller_over(&mock);

        assert!(matches!(
            controller.query_pass().await,
            Err(VnaError::Precondition(_))
        ));
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn test_query_pass_polarity() {
        let mock = MockTransport::with_responses(["1", "0"]);
        let mut controller = controller_over(&mock);
        controller.enable(true, true).await.unwrap();

        assert!(controller.query_pass().await.unwrap());
        assert!(!controller.query_pass().await.unwrap());
    }

    #[tokio::test]
    async fn test_query_pass_rejects_garbage() {
        let mock = MockTransport::with_responses(["PASS"]);
        let mut controller = controller_over(&mock);
        controller.enable(false, false).await.unwrap();

        assert!(matches!(
            controller.query_pass().await,
            Err(VnaError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_disable_gates_query_again() {
        let mock = MockTransport::with_responses(["1"]);
        let mut controller = controller_over(&mock);
        controller.enable(false, false).await.unwrap();
        controller.query_pass().await.unwrap();

        controller.disable().await.unwrap();
        assert!(matches!(
            controller.query_pass().await,
            Err(VnaError::Precondition(_))
        ));
    }
}
