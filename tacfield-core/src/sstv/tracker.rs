//! Slant and frequency-drift tracking (`spec.md` §4.E).
//!
//! Drift compensation applies only to pixel-decode frequency readings, never
//! to VIS bit classification (`spec.md` §9, resolved open question).

use std::collections::VecDeque;

use crate::utils::{median, stddev};

const MIN_PULSES_FOR_SLANT: usize = 10;
const SLANT_OUTLIER_FRACTION: f64 = 0.2;
const SLANT_RATIO_MIN: f64 = 0.95;
const SLANT_RATIO_MAX: f64 = 1.05;

/// Tracks the running median of observed sync-to-sync intervals over a
/// bounded window (`2 * window` pulses of history) to estimate horizontal
/// slant.
pub struct SlantTracker {
    intervals: VecDeque<f64>,
    capacity: usize,
}

impl SlantTracker {
    /// `window` is the nominal number of pulses the slant estimate should
    /// track; the ring buffer itself holds twice that so a recent outlier
    /// burst doesn't immediately evict the history it should be compared
    /// against.
    pub fn new(window: usize) -> Self {
        let capacity = window * 2;
        Self { intervals: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn record(&mut self, interval_ms: f64) {
        if self.intervals.len() == self.capacity {
            self.intervals.pop_front();
        }
        self.intervals.push_back(interval_ms);
    }

    /// Ratio of the mode's expected interval to the observed interval,
    /// after dropping samples more than 20% away from the running median
    /// and averaging what's left. Feeds directly into
    /// [`crate::sstv::raster::Raster::reslant`] as the `slant` parameter.
    /// `None` until at least 10 intervals have been recorded.
    pub fn slant_ratio(&self, expected_interval_ms: f64) -> Option<f64> {
        if self.intervals.len() < MIN_PULSES_FOR_SLANT || expected_interval_ms <= 0.0 {
            return None;
        }
        let samples: Vec<f64> = self.intervals.iter().copied().collect();
        let center = median(&samples);
        if center <= 0.0 {
            return None;
        }
        let survivors: Vec<f64> =
            samples.iter().copied().filter(|v| ((v - center).abs() / center) <= SLANT_OUTLIER_FRACTION).collect();
        if survivors.is_empty() {
            return None;
        }
        let measured = survivors.iter().sum::<f64>() / survivors.len() as f64;
        if measured <= 0.0 {
            return None;
        }
        Some((expected_interval_ms / measured).clamp(SLANT_RATIO_MIN, SLANT_RATIO_MAX))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

const MIN_DRIFT_SAMPLES: usize = 5;
const MAX_DRIFT_OFFSET_HZ: f64 = 50.0;
const MIN_CONFIDENCE_TO_APPLY: f64 = 0.3;
const CONFIDENCE_STDDEV_SCALE_HZ: f64 = 20.0;

/// Tracks the sync-tone frequency offset over a sliding time window,
/// low-pass filtering a robust (median-based) estimate of the raw
/// observations rather than the observations themselves.
pub struct DriftTracker {
    alpha: f64,
    window_ms: f64,
    samples: VecDeque<(f64, f64)>,
    elapsed_ms: f64,
    smoothed_offset_hz: f64,
}

impl DriftTracker {
    pub fn new(alpha: f64, window_ms: f64) -> Self {
        Self { alpha, window_ms, samples: VecDeque::new(), elapsed_ms: 0.0, smoothed_offset_hz: 0.0 }
    }

    /// Record one measured sync-tone frequency, `dt_ms` after the previous
    /// measurement, pruning anything older than the sliding window and
    /// updating the smoothed offset from the window's median.
    pub fn record_measurement(&mut self, measured_hz: f64, reference_hz: f64, dt_ms: f64) {
        self.elapsed_ms += dt_ms;
        self.samples.push_back((self.elapsed_ms, measured_hz));
        while let Some(&(t, _)) = self.samples.front() {
            if self.elapsed_ms - t > self.window_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        if self.samples.len() < MIN_DRIFT_SAMPLES {
            return;
        }
        let values: Vec<f64> = self.samples.iter().map(|&(_, hz)| hz).collect();
        let raw_offset = (median(&values) - reference_hz).clamp(-MAX_DRIFT_OFFSET_HZ, MAX_DRIFT_OFFSET_HZ);
        self.smoothed_offset_hz = self.alpha * raw_offset + (1.0 - self.alpha) * self.smoothed_offset_hz;
    }

    /// `1 - min(1, stddev / 20Hz)` over the current window; `0.0` before
    /// enough samples have been collected to say anything.
    pub fn confidence(&self) -> f64 {
        if self.samples.len() < MIN_DRIFT_SAMPLES {
            return 0.0;
        }
        let values: Vec<f64> = self.samples.iter().map(|&(_, hz)| hz).collect();
        1.0 - (stddev(&values) / CONFIDENCE_STDDEV_SCALE_HZ).min(1.0)
    }

    /// The offset to subtract from pixel-decode frequency readings. `0.0`
    /// while confidence is below threshold, so an unreliable estimate never
    /// actively degrades the decode.
    pub fn effective_offset_hz(&self) -> f64 {
        if self.confidence() >= MIN_CONFIDENCE_TO_APPLY {
            self.smoothed_offset_hz
        } else {
            0.0
        }
    }

    pub fn current_offset_hz(&self) -> f64 {
        self.smoothed_offset_hz
    }

    /// Number of measurements currently held in the sliding window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slant_ratio_is_one_for_nominal_intervals() {
        let mut tracker = SlantTracker::new(50);
        for _ in 0..50 {
            tracker.record(150.0);
        }
        assert!((tracker.slant_ratio(150.0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn slant_ratio_is_none_before_ten_pulses() {
        let mut tracker = SlantTracker::new(50);
        for _ in 0..9 {
            tracker.record(150.0);
        }
        assert_eq!(tracker.slant_ratio(150.0), None);
    }

    #[test]
    fn slant_tracker_caps_history_at_twice_the_window() {
        let mut tracker = SlantTracker::new(3);
        for v in 0..20 {
            tracker.record(v as f64);
        }
        assert_eq!(tracker.len(), 6);
    }

    #[test]
    fn slant_ratio_drops_outliers_before_averaging() {
        let mut tracker = SlantTracker::new(50);
        for _ in 0..15 {
            tracker.record(150.0);
        }
        tracker.record(500.0); // far more than 20% from the median; must not move the ratio
        let ratio = tracker.slant_ratio(150.0).unwrap();
        assert!((ratio - 1.0).abs() < 1e-6, "ratio={ratio}");
    }

    #[test]
    fn slant_ratio_reflects_a_slower_scan_clamped_to_the_valid_range() {
        let mut tracker = SlantTracker::new(50);
        for _ in 0..20 {
            tracker.record(200.0); // receiver's clock runs slow: lines take longer than expected
        }
        let ratio = tracker.slant_ratio(150.0).unwrap();
        assert!((ratio - SLANT_RATIO_MIN).abs() < 1e-9, "ratio={ratio}");
    }

    #[test]
    fn drift_tracker_converges_toward_constant_offset() {
        let mut tracker = DriftTracker::new(0.3, 5000.0);
        let reference = 1900.0;
        let measured = 1905.0;
        for _ in 0..50 {
            tracker.record_measurement(measured, reference, 50.0);
        }
        assert!((tracker.current_offset_hz() - 5.0).abs() < 1.0, "offset={}", tracker.current_offset_hz());
        assert!(tracker.confidence() > 0.9, "confidence={}", tracker.confidence());
    }

    #[test]
    fn drift_tracker_reports_zero_confidence_before_enough_samples() {
        let mut tracker = DriftTracker::new(0.1, 5000.0);
        tracker.record_measurement(1905.0, 1900.0, 50.0);
        assert_eq!(tracker.confidence(), 0.0);
        assert_eq!(tracker.effective_offset_hz(), 0.0);
    }

    #[test]
    fn drift_tracker_forgets_measurements_older_than_the_window() {
        let mut tracker = DriftTracker::new(0.5, 200.0);
        for _ in 0..10 {
            tracker.record_measurement(1905.0, 1900.0, 50.0);
        }
        assert!(tracker.samples.len() <= 4);
    }

    #[test]
    fn noisy_measurements_lower_confidence_below_the_application_threshold() {
        let mut tracker = DriftTracker::new(0.3, 5000.0);
        let mut toggle = false;
        for _ in 0..20 {
            let measured = if toggle { 1950.0 } else { 1850.0 };
            toggle = !toggle;
            tracker.record_measurement(measured, 1900.0, 50.0);
        }
        assert!(tracker.confidence() < MIN_CONFIDENCE_TO_APPLY, "confidence={}", tracker.confidence());
        assert_eq!(tracker.effective_offset_hz(), 0.0);
    }
}
