//! Persisted-state key-value interface (§6).
//!
//! The real settings/history store is an external collaborator (out of
//! scope per `spec.md` §1); this module only specifies the interface the
//! SSTV engine needs from it, plus an in-memory implementation for tests
//! and the CLI demo.

use std::collections::HashMap;

/// A minimal key-value store contract. Implementations own persistence;
/// the core only ever reads/writes opaque byte blobs under string keys.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&mut self, key: &str, value: Vec<u8>);
}

/// Settings relevant to SSTV transmit/receive (§6: `sstv_settings`).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SstvSettings {
    pub callsign: Option<String>,
    pub grid_square: Option<String>,
    pub default_mode: Option<String>,
    pub overlay_enabled: bool,
    pub license_acknowledged: bool,
    pub audio_input_device_id: Option<String>,
    pub audio_output_device_id: Option<String>,
    pub gain_db: f32,
    pub vox_enabled: bool,
}

pub const SSTV_SETTINGS_KEY: &str = "sstv_settings";
pub const SSTV_HISTORY_KEY: &str = "sstv_history";

/// Cap on the persisted image history (§6, "RECEIVING -> COMPLETE").
pub const HISTORY_CAPACITY: usize = 50;

/// One completed receive, as appended to the head of `sstv_history` on
/// RECEIVING -> COMPLETE (§6, §4.D).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub mode_name: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub width: usize,
    pub height: usize,
    /// Row-major RGBA bytes, as produced by [`crate::sstv::raster::Raster::to_rgba_bytes`].
    pub pixels: Vec<u8>,
    pub sync_count: usize,
    pub duration_ms: f64,
    pub slant_corrected: bool,
}

/// Load the persisted history list, newest first, falling back to an empty
/// list if absent or malformed.
pub fn load_history(store: &dyn SettingsStore) -> Vec<HistoryEntry> {
    store
        .get(SSTV_HISTORY_KEY)
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

/// Insert `entry` at the head of the persisted history, dropping the oldest
/// entries past [`HISTORY_CAPACITY`] (FIFO, §6).
pub fn push_history(store: &mut dyn SettingsStore, entry: HistoryEntry) {
    let mut history = load_history(store);
    history.insert(0, entry);
    history.truncate(HISTORY_CAPACITY);
    if let Ok(bytes) = serde_json::to_vec(&history) {
        store.set(SSTV_HISTORY_KEY, bytes);
    }
}

/// A simple in-memory [`SettingsStore`] for tests and the CLI demo.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsStore {
    values: HashMap<String, Vec<u8>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.values.insert(key.to_string(), value);
    }
}

impl SstvSettings {
    /// Load settings from a store, falling back to defaults if absent or
    /// malformed.
    pub fn load(store: &dyn SettingsStore) -> Self {
        store
            .get(SSTV_SETTINGS_KEY)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    /// Persist settings to a store.
    pub fn save(&self, store: &mut dyn SettingsStore) {
        if let Ok(bytes) = serde_json::to_vec(self) {
            store.set(SSTV_SETTINGS_KEY, bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_in_memory_store() {
        let mut store = InMemorySettingsStore::new();
        let mut settings = SstvSettings::load(&store);
        assert!(settings.callsign.is_none());

        settings.callsign = Some("N0CALL".to_string());
        settings.license_acknowledged = true;
        settings.save(&mut store);

        let reloaded = SstvSettings::load(&store);
        assert_eq!(reloaded.callsign.as_deref(), Some("N0CALL"));
        assert!(reloaded.license_acknowledged);
    }

    #[test]
    fn missing_key_yields_defaults() {
        let store = InMemorySettingsStore::new();
        let settings = SstvSettings::load(&store);
        assert!(!settings.license_acknowledged);
        assert!(settings.callsign.is_none());
    }

    fn sample_entry(mode_name: &str) -> HistoryEntry {
        HistoryEntry {
            mode_name: mode_name.to_string(),
            timestamp: chrono::Utc::now(),
            width: 320,
            height: 240,
            pixels: vec![0u8; 320 * 240 * 4],
            sync_count: 240,
            duration_ms: 36_000.0,
            slant_corrected: false,
        }
    }

    #[test]
    fn history_is_empty_when_absent() {
        let store = InMemorySettingsStore::new();
        assert!(load_history(&store).is_empty());
    }

    #[test]
    fn pushed_entries_land_at_the_head() {
        let mut store = InMemorySettingsStore::new();
        push_history(&mut store, sample_entry("Robot36"));
        push_history(&mut store, sample_entry("Scottie1"));

        let history = load_history(&store);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].mode_name, "Scottie1");
        assert_eq!(history[1].mode_name, "Robot36");
    }

    #[test]
    fn history_is_capped_and_drops_the_oldest() {
        let mut store = InMemorySettingsStore::new();
        for i in 0..(HISTORY_CAPACITY + 10) {
            push_history(&mut store, sample_entry(&format!("mode-{i}")));
        }
        let history = load_history(&store);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        // Most recently pushed entry is still at the head.
        assert_eq!(history[0].mode_name, format!("mode-{}", HISTORY_CAPACITY + 9));
        // The oldest surviving entry is the capacity-th most recent push.
        assert_eq!(history[HISTORY_CAPACITY - 1].mode_name, "mode-10");
    }
}
