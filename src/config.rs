//! Configuration loading for connection settings.
//!
//! Settings are loaded from a TOML file merged with `VNACTL_`-prefixed
//! environment variables, so a bench script can point at a different
//! instrument without editing the file:
//!
//! ```text
//! VNACTL_RESOURCE=192.168.1.50:5025
//! VNACTL_TIMEOUT_MS=2000
//! ```

use crate::error::{Result, VnaError};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection and session settings for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Address of the instrument: `host:port` for the TCP transport, or a
    /// VISA resource string (e.g. `TCPIP0::127.0.0.1::inst0::INSTR`) when
    /// built with the `transport_visa` feature.
    pub resource: String,

    /// Query timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// SCPI channel number interpolated into commands.
    #[serde(default = "default_channel")]
    pub channel: u8,

    /// Calibration kit number to select before manual calibration.
    #[serde(default)]
    pub cal_kit: Option<u8>,

    /// Settle time before polling completion of an ECal run, in
    /// milliseconds. ECal duration scales with port count and sweep
    /// settings, so this is a tunable, not a constant.
    #[serde(default = "default_ecal_settle_ms")]
    pub ecal_settle_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_channel() -> u8 {
    1
}

fn default_ecal_settle_ms() -> u64 {
    5000
}

impl Settings {
    /// Load settings from `config/default.toml` plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from("config/default.toml")
    }

    /// Load settings from the given TOML file plus environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VNACTL_"))
            .extract()
            .map_err(|e| VnaError::Config(e.to_string()))
    }

    /// Query timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// ECal settle time as a [`Duration`].
    pub fn ecal_settle(&self) -> Duration {
        Duration::from_millis(self.ecal_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Settings {
        Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .expect("settings should parse")
    }

    #[test]
    fn test_defaults_applied() {
        let settings = from_toml(r#"resource = "127.0.0.1:5025""#);
        assert_eq!(settings.resource, "127.0.0.1:5025");
        assert_eq!(settings.timeout_ms, 5000);
        assert_eq!(settings.channel, 1);
        assert_eq!(settings.cal_kit, None);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_values() {
        let settings = from_toml(
            r#"
            resource = "192.168.1.50:5025"
            timeout_ms = 2000
            channel = 2
            cal_kit = 1
            ecal_settle_ms = 8000
            "#,
        );
        assert_eq!(settings.channel, 2);
        assert_eq!(settings.cal_kit, Some(1));
        assert_eq!(settings.ecal_settle(), Duration::from_secs(8));
    }

    #[test]
    fn test_missing_resource_is_config_error() {
        let result: std::result::Result<Settings, figment::Error> =
            Figment::new().merge(Toml::string("timeout_ms = 100")).extract();
        assert!(result.is_err());
    }
}
