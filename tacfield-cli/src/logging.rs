//! Structured, operator-facing logging, distinct from the core's internal
//! [`tacfield_core::logging::SignalLogger`] (`spec.md` §10.3).

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use tacfield_core::settings::HISTORY_CAPACITY;

/// Structured log event types emitted by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    VisDetected { mode_name: String, vis_code: u8 },
    FrameComplete { width: usize, height: usize, elapsed_secs: f64 },
    HistoryAppended { mode_name: String, sync_count: usize, slant_corrected: bool, history_len: usize },
    PathAnalyzed(PathAnalyzedEvent),
    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathAnalyzedEvent {
    pub distance_m: f64,
    pub bearing_deg: f64,
    pub is_obstructed: bool,
    pub diffraction_loss_db: f64,
    pub received_power_dbm: f64,
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("file logging target requires file_path"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };
        Ok(Self { config, writer, start_time: Utc::now() })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => serde_json::to_string(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };
        writeln!(self.writer, "{output}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::VisDetected { mode_name, vis_code } => {
                format!("ts=\"{ts}\" type=vis_detected mode=\"{mode_name}\" vis_code={vis_code:#04x}")
            }
            LogEvent::FrameComplete { width, height, elapsed_secs } => {
                format!("ts=\"{ts}\" type=frame_complete width={width} height={height} elapsed_secs={elapsed_secs:.2}")
            }
            LogEvent::HistoryAppended { mode_name, sync_count, slant_corrected, history_len } => format!(
                "ts=\"{ts}\" type=history_appended mode=\"{mode_name}\" sync_count={sync_count} slant_corrected={slant_corrected} history_len={history_len}"
            ),
            LogEvent::PathAnalyzed(p) => format!(
                "ts=\"{ts}\" type=path_analyzed distance_m={:.1} bearing_deg={:.1} obstructed={} diffraction_loss_db={:.2} rx_power_dbm={:.2}",
                p.distance_m, p.bearing_deg, p.is_obstructed, p.diffraction_loss_db, p.received_power_dbm
            ),
            LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
            LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{ts}\" level=error msg=\"{message}\" details=\"{d}\""),
                None => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::VisDetected { mode_name, vis_code } => {
                format!("[{ts}] VIS: mode={mode_name} code={vis_code:#04x}")
            }
            LogEvent::FrameComplete { width, height, elapsed_secs } => {
                format!("[{ts}] FRAME COMPLETE: {width}x{height} in {elapsed_secs:.2}s")
            }
            LogEvent::HistoryAppended { mode_name, sync_count, slant_corrected, history_len } => format!(
                "[{ts}] HISTORY: {mode_name} appended (sync_count={sync_count}, slant_corrected={slant_corrected}, len={history_len}/{HISTORY_CAPACITY})"
            ),
            LogEvent::PathAnalyzed(p) => format!(
                "[{ts}] PATH: {:.0}m @ {:.1} deg | {} | diffraction={:.2}dB | rx={:.2}dBm",
                p.distance_m,
                p.bearing_deg,
                if p.is_obstructed { "OBSTRUCTED" } else { "CLEAR" },
                p.diffraction_loss_db,
                p.received_power_dbm
            ),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
            LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{ts}] ERROR: {message} | {d}"),
                None => format!("[{ts}] ERROR: {message}"),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
