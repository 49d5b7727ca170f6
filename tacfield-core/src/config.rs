//! Engine-wide numeric defaults, serde-derived so the CLI can override them
//! from a TOML file (`spec.md` §10.4).

use serde::{Deserialize, Serialize};

use crate::rfpath::ViewshedResolution;

/// Tunables for the SSTV engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SstvConfig {
    pub sample_rate_hz: f64,
    /// Goertzel analysis window, in samples.
    pub tone_window_samples: usize,
    /// EMA smoothing constant for frequency-drift compensation.
    pub drift_smoothing_alpha: f64,
    /// Drift-estimate reset window, in milliseconds.
    pub drift_window_ms: f64,
    /// Number of sync-to-sync intervals kept for slant estimation.
    pub slant_history_len: usize,
    /// Maximum time to wait for a VIS code before giving up, in milliseconds.
    pub vis_timeout_ms: u64,
}

impl Default for SstvConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000.0,
            tone_window_samples: 2048,
            drift_smoothing_alpha: 0.1,
            drift_window_ms: 5_000.0,
            slant_history_len: 50,
            vis_timeout_ms: 30_000,
        }
    }
}

/// Tunables for the RF path analysis engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfConfig {
    pub default_viewshed_resolution: ViewshedResolution,
    /// First-Fresnel clearance percentage below which a path is flagged
    /// obstructed.
    pub obstruction_clearance_threshold_percent: f64,
}

impl Default for RfConfig {
    fn default() -> Self {
        Self {
            default_viewshed_resolution: ViewshedResolution::Medium,
            obstruction_clearance_threshold_percent: 60.0,
        }
    }
}

/// The complete, persistable engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub sstv: SstvConfig,
    #[serde(default)]
    pub rf: RfConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let config = SstvConfig::default();
        assert_eq!(config.sample_rate_hz, 48_000.0);
        assert_eq!(config.tone_window_samples, 2048);
        assert_eq!(config.drift_smoothing_alpha, 0.1);
        assert_eq!(config.slant_history_len, 50);
    }

    #[test]
    fn partial_json_overrides_fall_back_to_defaults_for_the_rest() {
        let partial = serde_json::json!({ "sample_rate_hz": 44_100.0 });
        let parsed: SstvConfig = serde_json::from_value(partial).unwrap();
        assert_eq!(parsed.sample_rate_hz, 44_100.0);
        assert_eq!(parsed.tone_window_samples, 2048);
    }
}
