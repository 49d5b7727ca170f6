//! The receive/transmit engine: VIS handshake, 4-state frame assembly, and
//! the public `start_receive` / `stop_receive` / `transmit` / `get_state`
//! entry points (`spec.md` §4.D, §6).

use std::collections::VecDeque;

use crate::errors::{Result, SstvError};
use crate::settings::{HistoryEntry, SstvSettings};

use super::events::{EventSink, SstvEvent};
use super::modes::{mode_by_vis_code, ColorModel, ModeDescriptor};
use super::raster::Raster;
use super::scanner::{combine_gbr, combine_rgb, combine_ycrcb, scan_channel_luminance_compensated};
use super::synth::ToneSynthesizer;
use super::tone::{power_at, sync_peak_frequency};
use super::tracker::{DriftTracker, SlantTracker};
use super::vis::{generate_vis_preamble, try_decode_vis, Tone};

/// Window used to test for the 1900 Hz SSTV leader tone against a 2000 Hz
/// reference bin before arming VIS search (`spec.md` §4.D).
const LEADER_GATE_WINDOW_MS: f64 = 20.0;
const LEADER_GATE_POWER_RATIO: f64 = 5.0;

/// Sync-pulse detection window and power ratio, shared by slant and drift
/// measurement (`spec.md` §4.D "Sync detection").
const SYNC_GATE_WINDOW_MS: f64 = 10.0;
const SYNC_GATE_POWER_RATIO: f64 = 3.0;

/// Slant correction is skipped below this deviation from unity (`spec.md`
/// §4.D "RECEIVING -> COMPLETE").
const SLANT_CORRECTION_THRESHOLD: f64 = 0.002;

/// The four phases of the frame assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    /// Not receiving, or receiving but not yet locked onto a leader tone;
    /// `push_samples` only runs the leader-tone gate test.
    Idle,
    /// Leader tone detected; scanning the input buffer for a VIS
    /// leader/break/code sequence.
    AwaitingVis,
    /// A mode has been identified; assembling raster rows line by line.
    ReceivingLine,
    /// The full raster has been assembled and is ready to read back.
    Complete,
}

/// A read-only snapshot of engine state for `get_state`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderState {
    pub phase: DecoderPhase,
    pub mode_name: Option<&'static str>,
    pub rows_decoded: usize,
    pub total_rows: usize,
}

/// Nearest-known chroma reuse for color models where a row carries only one
/// chroma channel (Robot36): keep the last-seen Cr and Cb rows and pair
/// each new luma row against whichever are freshest (resolved open
/// question, `spec.md` §9/§12: grayscale-then-color-rewrite is equivalent
/// to pairing the incoming luma with the nearest available chroma, since
/// both converge to the same steady-state picture after the second row).
struct ChromaCache {
    cr: Option<Vec<u8>>,
    cb: Option<Vec<u8>>,
}

impl ChromaCache {
    fn new() -> Self {
        Self { cr: None, cb: None }
    }
}

pub struct SstvEngine<S: EventSink> {
    sample_rate_hz: f64,
    phase: DecoderPhase,
    armed: bool,
    mode: Option<&'static ModeDescriptor>,
    raster: Option<Raster>,
    row: usize,
    buffer: VecDeque<f32>,
    slant: SlantTracker,
    drift: DriftTracker,
    slant_correction_enabled: bool,
    vis_timeout_ms: u64,
    elapsed_awaiting_vis_ms: f64,
    total_elapsed_ms: f64,
    sync_count: usize,
    last_slant_corrected: bool,
    pending_history: Option<HistoryEntry>,
    chroma_cache: ChromaCache,
    sink: S,
}

impl<S: EventSink> SstvEngine<S> {
    pub fn new(sample_rate_hz: f64, vis_timeout_ms: u64, sink: S) -> Self {
        Self {
            sample_rate_hz,
            phase: DecoderPhase::Idle,
            armed: false,
            mode: None,
            raster: None,
            row: 0,
            buffer: VecDeque::new(),
            slant: SlantTracker::new(50),
            drift: DriftTracker::new(0.1, 5000.0),
            slant_correction_enabled: true,
            vis_timeout_ms,
            elapsed_awaiting_vis_ms: 0.0,
            total_elapsed_ms: 0.0,
            sync_count: 0,
            last_slant_corrected: false,
            pending_history: None,
            chroma_cache: ChromaCache::new(),
            sink,
        }
    }

    /// Disables the `|slant - 1| > 0.002` reslant applied on frame
    /// completion, leaving the decoded raster exactly as scanned.
    pub fn set_slant_correction_enabled(&mut self, enabled: bool) {
        self.slant_correction_enabled = enabled;
    }

    pub fn start_receive(&mut self) {
        let from = self.phase;
        self.phase = DecoderPhase::Idle;
        self.armed = true;
        self.mode = None;
        self.raster = None;
        self.row = 0;
        self.buffer.clear();
        self.elapsed_awaiting_vis_ms = 0.0;
        self.total_elapsed_ms = 0.0;
        self.sync_count = 0;
        self.last_slant_corrected = false;
        self.pending_history = None;
        self.chroma_cache = ChromaCache::new();
        if from != self.phase {
            self.sink.notify(SstvEvent::PhaseChanged { from, to: self.phase });
        }
        self.sink.notify(SstvEvent::ReceiveStarted);
    }

    /// Per `spec.md` §7, a VIS timeout is a recovered-locally condition: it
    /// is surfaced as an event, not returned as an `Err` from this method.
    pub fn stop_receive(&mut self) {
        let from = self.phase;
        self.phase = DecoderPhase::Idle;
        self.armed = false;
        if from != self.phase {
            self.sink.notify(SstvEvent::PhaseChanged { from, to: self.phase });
        }
        self.sink.notify(SstvEvent::ReceiveStopped);
    }

    pub fn get_state(&self) -> DecoderState {
        DecoderState {
            phase: self.phase,
            mode_name: self.mode.map(|m| m.name),
            rows_decoded: self.row,
            total_rows: self.mode.map(|m| m.height).unwrap_or(0),
        }
    }

    /// Feed newly arrived audio into the cooperative receive loop. Call
    /// this repeatedly as samples become available; each call advances the
    /// state machine as far as the buffered audio allows and returns.
    pub fn push_samples(&mut self, samples: &[f32]) {
        if !self.armed || self.phase == DecoderPhase::Complete {
            return;
        }
        self.buffer.extend(samples.iter().copied());
        let batch_ms = samples.len() as f64 / self.sample_rate_hz * 1000.0;
        self.total_elapsed_ms += batch_ms;
        if self.phase == DecoderPhase::AwaitingVis {
            self.elapsed_awaiting_vis_ms += batch_ms;
        }

        // Re-dispatch within the same call whenever a sub-step advances the
        // phase, so a whole transmission fed in one batch (as tests and the
        // WAV-file CLI path do) runs to completion without the caller
        // needing to call this in a loop themselves.
        loop {
            let phase_before = self.phase;
            match self.phase {
                DecoderPhase::Idle => self.advance_idle_gate(),
                DecoderPhase::AwaitingVis => self.advance_vis_search(),
                DecoderPhase::ReceivingLine => self.advance_line_decode(),
                DecoderPhase::Complete => break,
            }
            if self.phase == phase_before {
                break;
            }
        }
    }

    /// IDLE -> VIS_DETECT: hold off VIS search until the 1900 Hz leader
    /// tone's Goertzel power exceeds the 2000 Hz reference by 5x over a
    /// short window (`spec.md` §4.D).
    fn advance_idle_gate(&mut self) {
        let window = ms_to_samples(LEADER_GATE_WINDOW_MS, self.sample_rate_hz);
        if window == 0 {
            return;
        }
        // Slide the test window one sample at a time from the front of the
        // buffer, so a leader tone buried anywhere in a large batch of
        // pushed samples (as in a one-shot test feed) is still found.
        while self.buffer.len() >= window {
            let chunk: Vec<f32> = self.buffer.iter().take(window).copied().collect();
            let leader_power = power_at(&chunk, 1900.0, self.sample_rate_hz);
            let reference_power = power_at(&chunk, 2000.0, self.sample_rate_hz);
            if leader_power > 0.0 && leader_power > LEADER_GATE_POWER_RATIO * reference_power {
                let from = self.phase;
                self.phase = DecoderPhase::AwaitingVis;
                self.elapsed_awaiting_vis_ms = 0.0;
                self.sink.notify(SstvEvent::PhaseChanged { from, to: self.phase });
                return;
            }
            self.buffer.pop_front();
        }
    }

    fn advance_vis_search(&mut self) {
        let buffered: Vec<f32> = self.buffer.iter().copied().collect();
        if let Some(result) = try_decode_vis(&buffered, self.sample_rate_hz) {
            self.buffer.drain(0..result.samples_consumed);
            if let Some(mode) = mode_by_vis_code(result.code) {
                self.mode = Some(mode);
                self.raster = Some(Raster::new(mode.width, mode.height));
                self.row = 0;
                self.elapsed_awaiting_vis_ms = 0.0;

                let from = self.phase;
                self.phase = DecoderPhase::ReceivingLine;
                self.sink.notify(SstvEvent::VisDetected { mode_name: mode.name, vis_code: mode.vis_code });
                self.sink.notify(SstvEvent::PhaseChanged { from, to: self.phase });
            }
            return;
        }

        // VIS_DETECT -> IDLE: give up and re-arm the leader-tone gate
        // rather than continuing to scan for a VIS code forever.
        if self.elapsed_awaiting_vis_ms >= self.vis_timeout_ms as f64 {
            self.sink.notify(SstvEvent::VisTimedOut { elapsed_ms: self.elapsed_awaiting_vis_ms as u64 });
            self.elapsed_awaiting_vis_ms = 0.0;
            self.buffer.clear();
            let from = self.phase;
            self.phase = DecoderPhase::Idle;
            self.sink.notify(SstvEvent::PhaseChanged { from, to: self.phase });
        }
    }

    fn advance_line_decode(&mut self) {
        let mode = match self.mode {
            Some(m) => m,
            None => return,
        };

        loop {
            let needed = ms_to_samples(mode.line_time_ms(), self.sample_rate_hz);
            if self.buffer.len() < needed {
                break;
            }
            let line: Vec<f32> = self.buffer.drain(0..needed).collect();
            self.decode_one_line(mode, &line);

            if self.row >= mode.height {
                self.apply_slant_correction_if_due(mode);
                self.pending_history = self.raster.as_ref().map(|raster| HistoryEntry {
                    mode_name: mode.name.to_string(),
                    timestamp: chrono::Utc::now(),
                    width: raster.width(),
                    height: raster.height(),
                    pixels: raster.to_rgba_bytes(),
                    sync_count: self.sync_count,
                    duration_ms: self.total_elapsed_ms,
                    slant_corrected: self.last_slant_corrected,
                });

                let from = self.phase;
                self.phase = DecoderPhase::Complete;
                self.sink.notify(SstvEvent::FrameComplete { width: mode.width, height: mode.height });
                self.sink.notify(SstvEvent::PhaseChanged { from, to: self.phase });
                break;
            }
        }
    }

    /// RECEIVING -> COMPLETE: reslant the finished raster when correction
    /// is enabled and the tracked factor has drifted enough to matter
    /// (`spec.md` §4.D, §4.E). The raster is always published, reslanted
    /// or not.
    fn apply_slant_correction_if_due(&mut self, mode: &'static ModeDescriptor) {
        if !self.slant_correction_enabled {
            return;
        }
        let Some(factor) = self.slant.slant_ratio(mode.line_time_ms()) else {
            return;
        };
        if (factor - 1.0).abs() <= SLANT_CORRECTION_THRESHOLD {
            return;
        }
        if let Some(raster) = self.raster.take() {
            self.raster = Some(raster.reslant(factor));
        }
        self.last_slant_corrected = true;
        self.sink.notify(SstvEvent::SlantAnalysis {
            expected_interval_ms: mode.line_time_ms(),
            measured_interval_ms: mode.line_time_ms() / factor,
            factor,
            percent: (factor - 1.0) * 100.0,
            sample_count: self.slant.len(),
        });
    }

    fn decode_one_line(&mut self, mode: &'static ModeDescriptor, line: &[f32]) {
        let sr = self.sample_rate_hz;
        self.track_sync_timing(mode, line);
        let drift_offset_hz = self.drift.effective_offset_hz();

        let mut offset = ms_to_samples(mode.sync_ms + mode.porch_ms, sr);

        let rows: Vec<[u8; 3]>;
        let rows_per_sync;

        match mode.color_model {
            ColorModel::Gbr { separator_ms } => {
                let g = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let b = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let r = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                rows = combine_gbr(&g, &b, &r);
                rows_per_sync = 1;
            }
            ColorModel::Rgb { separator_ms } => {
                let r = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let g = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let b = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                rows = combine_rgb(&r, &g, &b);
                rows_per_sync = 1;
            }
            ColorModel::YCrCbAlternating { chroma_ms, separator_ms } => {
                let y = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let chroma = take_channel(line, &mut offset, chroma_ms, sr, mode.width, drift_offset_hz);
                if self.row % 2 == 0 {
                    self.chroma_cache.cr = Some(chroma);
                } else {
                    self.chroma_cache.cb = Some(chroma);
                }
                let neutral = vec![128u8; mode.width];
                let cr = self.chroma_cache.cr.as_ref().unwrap_or(&neutral);
                let cb = self.chroma_cache.cb.as_ref().unwrap_or(&neutral);
                rows = combine_ycrcb(&y, cr, cb);
                rows_per_sync = 1;
            }
            ColorModel::YCrCbPerLine { chroma_ms, separator_ms } => {
                let y = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let cr = take_channel(line, &mut offset, chroma_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, separator_ms, sr);
                let cb = take_channel(line, &mut offset, chroma_ms, sr, mode.width, drift_offset_hz);
                rows = combine_ycrcb(&y, &cr, &cb);
                rows_per_sync = 1;
            }
            ColorModel::YCrCbLinePair { chroma_ms, chroma_porch_ms, .. } => {
                let y0 = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                let y1 = take_channel(line, &mut offset, mode.scan_ms, sr, mode.width, drift_offset_hz);
                skip(&mut offset, chroma_porch_ms.unwrap_or(0.0), sr);
                let cr = take_channel(line, &mut offset, chroma_ms, sr, mode.width, drift_offset_hz);
                let cb = take_channel(line, &mut offset, chroma_ms, sr, mode.width, drift_offset_hz);
                let row0 = combine_ycrcb(&y0, &cr, &cb);
                let row1 = combine_ycrcb(&y1, &cr, &cb);
                rows = row0.into_iter().chain(row1).collect();
                rows_per_sync = 2;
            }
        }

        if let Some(raster) = self.raster.as_mut() {
            for r in 0..rows_per_sync.min(mode.height - self.row) {
                let row_pixels = &rows[r * mode.width..(r + 1) * mode.width];
                for (x, pixel) in row_pixels.iter().enumerate() {
                    raster.set_rgb(x, self.row + r, *pixel);
                }
            }
        }

        self.row += rows_per_sync;
        self.sink.notify(SstvEvent::LineDecoded { row: self.row.min(mode.height), total_rows: mode.height });
    }

    /// "On each detected sync" (`spec.md` §4.E): gate on the same
    /// 1200 Hz-over-1800 Hz sync-detection test used to locate lines, then
    /// feed a measured line interval to the slant tracker and, if the
    /// sync-tone peak is strong enough, a frequency sample to the drift
    /// tracker.
    fn track_sync_timing(&mut self, mode: &'static ModeDescriptor, line: &[f32]) {
        let sr = self.sample_rate_hz;
        let gate_window = ms_to_samples(SYNC_GATE_WINDOW_MS, sr).min(line.len());
        if gate_window == 0 {
            return;
        }
        let gate_chunk = &line[..gate_window];
        let reference_power = power_at(gate_chunk, 1800.0, sr);
        let sync_power = power_at(gate_chunk, 1200.0, sr);
        if sync_power <= SYNC_GATE_POWER_RATIO * reference_power {
            return;
        }
        self.sync_count += 1;

        let max_span_ms = (mode.sync_ms * 0.5).min(SYNC_GATE_WINDOW_MS);
        if let Some(offset_samples) = find_sync_offset_samples(line, sr, max_span_ms) {
            let offset_ms = offset_samples as f64 / sr * 1000.0;
            self.slant.record(mode.line_time_ms() + offset_ms);
        }

        let (peak_hz, peak_power) = sync_peak_frequency(gate_chunk, sr);
        if peak_power > SYNC_GATE_POWER_RATIO * reference_power {
            self.drift.record_measurement(peak_hz, 1200.0, mode.line_time_ms());
            if self.drift.confidence() >= 0.3 {
                self.sink.notify(SstvEvent::DriftAnalysis {
                    drift_hz: self.drift.effective_offset_hz(),
                    confidence: self.drift.confidence(),
                    measured_sync_hz: peak_hz,
                    expected_sync_hz: 1200.0,
                    count: self.drift.len(),
                });
            }
        }
    }

    /// Read the assembled raster back out. Only meaningful once
    /// `get_state().phase == DecoderPhase::Complete`.
    pub fn take_raster(&mut self) -> Option<Raster> {
        self.raster.take()
    }

    /// Read the history record for the just-completed frame, for the caller
    /// to append to the persisted `sstv_history` list via
    /// [`crate::settings::push_history`]. Only set once, at the moment the
    /// engine reaches [`DecoderPhase::Complete`]; `None` before or after
    /// that single read.
    pub fn take_history_entry(&mut self) -> Option<HistoryEntry> {
        self.pending_history.take()
    }

    /// Like [`Self::transmit`], but checks `settings` for the operator
    /// prerequisites first (`spec.md` §7: `CallsignMissing`/
    /// `LicenseMissing`), surfacing a hard error instead of keying a
    /// transmitter with no callsign or an unacknowledged license.
    pub fn transmit_checked(
        &mut self,
        mode: &'static ModeDescriptor,
        raster: &Raster,
        settings: &SstvSettings,
    ) -> Result<Vec<f32>> {
        if settings.callsign.as_deref().unwrap_or("").is_empty() {
            return Err(SstvError::CallsignMissing.into());
        }
        if !settings.license_acknowledged {
            return Err(SstvError::LicenseMissing.into());
        }
        Ok(self.transmit(mode, raster))
    }

    /// Render a full transmission for `raster` in `mode`: VIS preamble
    /// followed by sync/porch/scan tone sequences for every row.
    pub fn transmit(&mut self, mode: &'static ModeDescriptor, raster: &Raster) -> Vec<f32> {
        let mut synth = ToneSynthesizer::new(self.sample_rate_hz);
        let preamble = generate_vis_preamble(mode.vis_code);
        let preamble_ms: f64 = preamble.iter().map(|t| t.duration_ms).sum();
        self.sink.notify(SstvEvent::TransmitStarted {
            mode_name: mode.name,
            duration_ms: preamble_ms + mode.nominal_total_seconds() * 1000.0,
        });
        let mut out = synth.render(&preamble);

        let rows_per_sync = mode.color_model.rows_per_sync();
        let mut row = 0usize;
        while row < mode.height {
            let tones = self.line_tones(mode, raster, row);
            out.extend(synth.render(&tones));
            row += rows_per_sync;
            self.sink.notify(SstvEvent::TransmitProgress { fraction: row as f64 / mode.height as f64 });
        }

        self.sink.notify(SstvEvent::TransmitComplete);
        out
    }

    fn line_tones(&self, mode: &'static ModeDescriptor, raster: &Raster, row: usize) -> Vec<Tone> {
        use super::scanner::rgb_to_ycrcb;
        use super::tone::luminance_to_freq;

        let mut tones = vec![
            Tone { freq_hz: 1200.0, duration_ms: mode.sync_ms },
            Tone { freq_hz: 1500.0, duration_ms: mode.porch_ms },
        ];

        let pixel_ms = |duration_ms: f64| duration_ms / mode.width as f64;
        let mut push_channel = |channel: Vec<u8>, duration_ms: f64| {
            let step = pixel_ms(duration_ms);
            for value in channel {
                tones.push(Tone { freq_hz: luminance_to_freq(value), duration_ms: step });
            }
        };

        match mode.color_model {
            ColorModel::Gbr { separator_ms } => {
                let (g, b, r) = gbr_channels(raster, row, mode.width);
                push_channel(g, mode.scan_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                push_channel(b, mode.scan_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                push_channel(r, mode.scan_ms);
            }
            ColorModel::Rgb { separator_ms } => {
                let (r, g, b) = rgb_channels(raster, row, mode.width);
                push_channel(r, mode.scan_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                push_channel(g, mode.scan_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                push_channel(b, mode.scan_ms);
            }
            ColorModel::YCrCbAlternating { chroma_ms, separator_ms } => {
                let (y, cr, cb) = ycrcb_channels(raster, row, mode.width, rgb_to_ycrcb);
                push_channel(y, mode.scan_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                let chroma = if row % 2 == 0 { cr } else { cb };
                push_channel(chroma, chroma_ms);
            }
            ColorModel::YCrCbPerLine { chroma_ms, separator_ms } => {
                let (y, cr, cb) = ycrcb_channels(raster, row, mode.width, rgb_to_ycrcb);
                push_channel(y, mode.scan_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                push_channel(cr, chroma_ms);
                tones.push(Tone { freq_hz: 1500.0, duration_ms: separator_ms });
                push_channel(cb, chroma_ms);
            }
            ColorModel::YCrCbLinePair { chroma_ms, chroma_porch_ms, .. } => {
                let (y0, cr0, cb0) = ycrcb_channels(raster, row, mode.width, rgb_to_ycrcb);
                let next_row = (row + 1).min(mode.height - 1);
                let (y1, _cr1, _cb1) = ycrcb_channels(raster, next_row, mode.width, rgb_to_ycrcb);
                push_channel(y0, mode.scan_ms);
                push_channel(y1, mode.scan_ms);
                if let Some(porch) = chroma_porch_ms {
                    tones.push(Tone { freq_hz: 1500.0, duration_ms: porch });
                }
                push_channel(cr0, chroma_ms);
                push_channel(cb0, chroma_ms);
            }
        }

        tones
    }
}

fn ms_to_samples(ms: f64, sample_rate_hz: f64) -> usize {
    (sample_rate_hz * ms / 1000.0).round() as usize
}

fn skip(offset: &mut usize, ms: f64, sample_rate_hz: f64) {
    *offset += ms_to_samples(ms, sample_rate_hz);
}

#[allow(clippy::too_many_arguments)]
fn take_channel(
    line: &[f32],
    offset: &mut usize,
    duration_ms: f64,
    sample_rate_hz: f64,
    width: usize,
    drift_offset_hz: f64,
) -> Vec<u8> {
    let len = ms_to_samples(duration_ms, sample_rate_hz);
    let end = (*offset + len).min(line.len());
    let slice = if *offset < end { &line[*offset..end] } else { &[] };
    *offset = end;
    scan_channel_luminance_compensated(slice, sample_rate_hz, width, drift_offset_hz)
}

/// Search the first `max_span_ms` of `line` for the sample offset at which
/// the sync-detection gate (1200 Hz power > 3x the 1800 Hz reference over a
/// short window) is satisfied, used to measure the actual sync-to-sync
/// interval rather than assuming it always equals the mode's nominal line
/// time (`spec.md` §4.E).
fn find_sync_offset_samples(line: &[f32], sample_rate_hz: f64, max_span_ms: f64) -> Option<usize> {
    const PROBE_WINDOW_MS: f64 = 2.0;

    let window = ms_to_samples(PROBE_WINDOW_MS, sample_rate_hz).max(1);
    let span = ms_to_samples(max_span_ms, sample_rate_hz).min(line.len().saturating_sub(window));
    for offset in 0..=span {
        let end = offset + window;
        if end > line.len() {
            break;
        }
        let chunk = &line[offset..end];
        let sync_power = power_at(chunk, 1200.0, sample_rate_hz);
        let reference_power = power_at(chunk, 1800.0, sample_rate_hz);
        if sync_power > SYNC_GATE_POWER_RATIO * reference_power {
            return Some(offset);
        }
    }
    None
}

fn gbr_channels(raster: &Raster, row: usize, width: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut g = Vec::with_capacity(width);
    let mut b = Vec::with_capacity(width);
    let mut r = Vec::with_capacity(width);
    for x in 0..width {
        let rgb = raster.get_rgb(x, row.min(raster.height() - 1));
        r.push(rgb[0]);
        g.push(rgb[1]);
        b.push(rgb[2]);
    }
    (g, b, r)
}

fn rgb_channels(raster: &Raster, row: usize, width: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut r = Vec::with_capacity(width);
    let mut g = Vec::with_capacity(width);
    let mut b = Vec::with_capacity(width);
    for x in 0..width {
        let rgb = raster.get_rgb(x, row.min(raster.height() - 1));
        r.push(rgb[0]);
        g.push(rgb[1]);
        b.push(rgb[2]);
    }
    (r, g, b)
}

fn ycrcb_channels(
    raster: &Raster,
    row: usize,
    width: usize,
    to_ycrcb: fn([u8; 3]) -> [u8; 3],
) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut y = Vec::with_capacity(width);
    let mut cr = Vec::with_capacity(width);
    let mut cb = Vec::with_capacity(width);
    for x in 0..width {
        let rgb = raster.get_rgb(x, row.min(raster.height() - 1));
        let ycc = to_ycrcb(rgb);
        y.push(ycc[0]);
        cr.push(ycc[1]);
        cb.push(ycc[2]);
    }
    (y, cr, cb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sstv::events::NullSink;
    use crate::sstv::modes::mode_by_name;
    use crate::sstv::synth::ToneSynthesizer;

    fn filled_raster(mode: &ModeDescriptor) -> Raster {
        let mut raster = Raster::new(mode.width, mode.height);
        for y in 0..mode.height {
            for x in 0..mode.width {
                raster.set_rgb(x, y, [((x * 7) % 256) as u8, ((y * 3) % 256) as u8, 128]);
            }
        }
        raster
    }

    /// A bare 1900 Hz leader tone, long enough to satisfy the idle gate,
    /// with nothing resembling a valid VIS code after it.
    fn leader_tone_only(sample_rate_hz: f64) -> Vec<f32> {
        let mut synth = ToneSynthesizer::new(sample_rate_hz);
        synth.render(&[Tone { freq_hz: 1900.0, duration_ms: 50.0 }])
    }

    #[test]
    fn idle_unarmed_engine_ignores_pushed_samples() {
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        engine.push_samples(&[0.0; 100]);
        assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
    }

    #[test]
    fn start_receive_stays_idle_without_a_leader_tone() {
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        engine.start_receive();
        engine.push_samples(&[0.0; 4800]);
        assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
    }

    #[test]
    fn a_leader_tone_arms_vis_search() {
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        engine.start_receive();
        engine.push_samples(&leader_tone_only(48_000.0));
        assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);
    }

    #[test]
    fn full_round_trip_robot36_reaches_complete() {
        let mode = mode_by_name("Robot36").unwrap();
        let raster = filled_raster(mode);

        let mut tx = SstvEngine::new(48_000.0, 30_000, NullSink);
        let audio = tx.transmit(mode, &raster);

        let mut rx = SstvEngine::new(48_000.0, 30_000, NullSink);
        rx.start_receive();
        // Feed the whole transmission in one shot; push_samples drains the
        // state machine as far as it can each call.
        rx.push_samples(&audio);

        let state = rx.get_state();
        assert_eq!(state.phase, DecoderPhase::Complete);
        assert_eq!(state.mode_name, Some("Robot36"));
        assert_eq!(state.rows_decoded, mode.height);
    }

    #[test]
    fn vis_timeout_is_reported_as_an_event_not_an_error() {
        use crate::sstv::events::{ChannelSink, SstvEvent};

        let (sink, receiver) = ChannelSink::new(32);
        let mut engine = SstvEngine::new(48_000.0, 10, sink);
        engine.start_receive();
        engine.push_samples(&leader_tone_only(48_000.0));
        assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);
        engine.push_samples(&vec![0.0f32; 48_000]);

        let events: Vec<SstvEvent> = receiver.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, SstvEvent::VisTimedOut { .. })));
        assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
    }

    #[test]
    fn stop_receive_disarms_the_engine() {
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        engine.start_receive();
        engine.push_samples(&leader_tone_only(48_000.0));
        assert_eq!(engine.get_state().phase, DecoderPhase::AwaitingVis);
        engine.stop_receive();
        assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
        engine.push_samples(&leader_tone_only(48_000.0));
        assert_eq!(engine.get_state().phase, DecoderPhase::Idle);
    }

    #[test]
    fn completion_populates_a_history_entry_exactly_once() {
        let mode = mode_by_name("Robot36").unwrap();
        let raster = filled_raster(mode);

        let mut tx = SstvEngine::new(48_000.0, 30_000, NullSink);
        let audio = tx.transmit(mode, &raster);

        let mut rx = SstvEngine::new(48_000.0, 30_000, NullSink);
        rx.start_receive();
        rx.push_samples(&audio);
        assert_eq!(rx.get_state().phase, DecoderPhase::Complete);

        let entry = rx.take_history_entry().expect("a completed frame must populate history");
        assert_eq!(entry.mode_name, "Robot36");
        assert_eq!(entry.width, mode.width);
        assert_eq!(entry.height, mode.height);
        assert_eq!(entry.pixels.len(), mode.width * mode.height * 4);
        assert!(entry.duration_ms > 0.0);
        assert!(rx.take_history_entry().is_none(), "history entry must only be handed out once");
    }

    #[test]
    fn transmit_checked_rejects_missing_callsign() {
        let mode = mode_by_name("Robot36").unwrap();
        let raster = filled_raster(mode);
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        let settings = SstvSettings { license_acknowledged: true, ..Default::default() };
        let err = engine.transmit_checked(mode, &raster, &settings).unwrap_err();
        assert!(matches!(err, crate::errors::TacFieldError::Sstv(SstvError::CallsignMissing)));
    }

    #[test]
    fn transmit_checked_rejects_unacknowledged_license() {
        let mode = mode_by_name("Robot36").unwrap();
        let raster = filled_raster(mode);
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        let settings = SstvSettings { callsign: Some("N0CALL".to_string()), ..Default::default() };
        let err = engine.transmit_checked(mode, &raster, &settings).unwrap_err();
        assert!(matches!(err, crate::errors::TacFieldError::Sstv(SstvError::LicenseMissing)));
    }

    #[test]
    fn transmit_checked_succeeds_with_prerequisites_met() {
        let mode = mode_by_name("Robot36").unwrap();
        let raster = filled_raster(mode);
        let mut engine = SstvEngine::new(48_000.0, 30_000, NullSink);
        let settings = SstvSettings {
            callsign: Some("N0CALL".to_string()),
            license_acknowledged: true,
            ..Default::default()
        };
        let audio = engine.transmit_checked(mode, &raster, &settings).unwrap();
        assert!(!audio.is_empty());
    }
}
