//! Instrument-side state persistence.
//!
//! Slots live on the analyzer's own storage as `.sta` files; the store only
//! issues the save-type flag, store, and load commands and never manages a
//! local file format.

use crate::channel::{CommandChannel, ErrorEntry};
use crate::error::Result;
use log::info;

/// Save, preset, and recall of named configuration slots.
pub struct StateStore {
    channel: CommandChannel,
}

impl StateStore {
    pub fn new(channel: CommandChannel) -> Self {
        Self { channel }
    }

    /// Store the current configuration under `slot`.
    ///
    /// The save-type flag selects calibration-and-state versus state-only,
    /// and the instrument latches it: whatever flag was set last governs the
    /// next store. The flag and the store are therefore always issued
    /// together here, flag first.
    pub async fn save(&self, slot: &str, include_calibration: bool) -> Result<()> {
        let save_type = if include_calibration { "CST" } else { "STAT" };
        self.channel
            .send(&format!(":MMEM:STOR:STYP {save_type}"))
            .await?;
        self.channel
            .send(&format!(":MMEM:STOR {}", slot_filename(slot)))
            .await?;
        info!("stored state to '{}' ({})", slot, save_type);
        Ok(())
    }

    /// Restore factory defaults.
    ///
    /// Destructive: any configuration or calibration that was not saved to
    /// a slot is discarded irreversibly. Never called implicitly by
    /// [`recall`](Self::recall).
    pub async fn preset(&self) -> Result<()> {
        self.channel.send(":SYST:PRES").await
    }

    /// Load a previously stored slot.
    ///
    /// The load command itself returns no success indication; a missing
    /// slot only shows up in the instrument's error queue. The queue is
    /// drained after the load and returned, so an empty vec means the
    /// recall took effect.
    pub async fn recall(&self, slot: &str) -> Result<Vec<ErrorEntry>> {
        self.channel
            .send(&format!(":MMEM:LOAD {}", slot_filename(slot)))
            .await?;
        let errors = self.channel.drain_errors().await?;
        if errors.is_empty() {
            info!("recalled state from '{}'", slot);
        }
        Ok(errors)
    }
}

fn slot_filename(slot: &str) -> String {
    if slot.ends_with(".sta") {
        slot.to_string()
    } else {
        format!("{slot}.sta")
    }
}
