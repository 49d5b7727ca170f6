//! `sstv encode` / `sstv decode` subcommands: WAV-driven demo paths for the
//! SSTV codec (`spec.md` §11 supplemented features).

use std::path::Path;

use color_eyre::eyre::{eyre, Result};

use tacfield_core::settings::{load_history, push_history, InMemorySettingsStore, SstvSettings};
use tacfield_core::sstv::{mode_by_name, DecoderPhase, NullSink, Raster, SstvEngine};

use crate::logging::{LogEvent, StructuredLogger};

#[allow(clippy::too_many_arguments)]
pub fn encode(
    mode_name: &str,
    image_path: &Path,
    wav_path: &Path,
    sample_rate_hz: f64,
    callsign: &str,
    license_ack: bool,
    logger: &mut StructuredLogger,
) -> Result<()> {
    let mode = mode_by_name(mode_name).ok_or_else(|| eyre!("unknown mode: {mode_name}"))?;

    let image = image::open(image_path)
        .map_err(|e| eyre!("failed to read image {}: {e}", image_path.display()))?
        .to_rgb8();
    let resized = image::imageops::resize(&image, mode.width as u32, mode.height as u32, image::imageops::FilterType::Triangle);

    let mut raster = Raster::new(mode.width, mode.height);
    for y in 0..mode.height {
        for x in 0..mode.width {
            let px = resized.get_pixel(x as u32, y as u32);
            raster.set_rgb(x, y, [px[0], px[1], px[2]]);
        }
    }

    let settings = SstvSettings {
        callsign: Some(callsign.to_string()),
        license_acknowledged: license_ack,
        ..Default::default()
    };
    let mut engine = SstvEngine::new(sample_rate_hz, 30_000, NullSink);
    let audio = engine.transmit_checked(mode, &raster, &settings)?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(wav_path, spec)?;
    for sample in &audio {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    logger.log(LogEvent::Info {
        message: format!("encoded {mode_name} ({} samples, {:.1}s) to {}", audio.len(), audio.len() as f64 / sample_rate_hz, wav_path.display()),
    })?;
    Ok(())
}

pub fn decode(wav_path: &Path, out_path: &Path, logger: &mut StructuredLogger) -> Result<()> {
    let mut reader = hound::WavReader::open(wav_path)?;
    let spec = reader.spec();
    let sample_rate_hz = spec.sample_rate as f64;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
            .collect::<Result<_, _>>()?,
    };

    let mut engine = SstvEngine::new(sample_rate_hz, 30_000, NullSink);
    engine.start_receive();
    engine.push_samples(&samples);

    let state = engine.get_state();
    if state.phase != DecoderPhase::Complete {
        return Err(eyre!("decode did not complete: phase={:?}, rows={}/{}", state.phase, state.rows_decoded, state.total_rows));
    }

    let mode_name = state.mode_name.unwrap_or("unknown").to_string();
    let mut decoded_width = 0usize;
    let mut decoded_height = 0usize;
    if let Some(raster) = engine.take_raster() {
        decoded_width = raster.width();
        decoded_height = raster.height();
        let mut image_buf = image::RgbImage::new(raster.width() as u32, raster.height() as u32);
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                let rgb = raster.get_rgb(x, y);
                image_buf.put_pixel(x as u32, y as u32, image::Rgb(rgb));
            }
        }
        image_buf.save(out_path).map_err(|e| eyre!("failed to write {}: {e}", out_path.display()))?;
    }

    logger.log(LogEvent::VisDetected { mode_name: mode_name.clone(), vis_code: 0 })?;
    logger.log(LogEvent::FrameComplete {
        width: decoded_width,
        height: decoded_height,
        elapsed_secs: samples.len() as f64 / sample_rate_hz,
    })?;

    // The real history store is an external collaborator (`spec.md` §6); this
    // in-memory one demonstrates the bounded-append contract for a single run.
    if let Some(entry) = engine.take_history_entry() {
        let mut store = InMemorySettingsStore::new();
        push_history(&mut store, entry.clone());
        let history_len = load_history(&store).len();
        logger.log(LogEvent::HistoryAppended {
            mode_name: entry.mode_name,
            sync_count: entry.sync_count,
            slant_corrected: entry.slant_corrected,
            history_len,
        })?;
    }

    logger.log(LogEvent::Info { message: format!("decoded {mode_name} to {}", out_path.display()) })?;
    Ok(())
}
