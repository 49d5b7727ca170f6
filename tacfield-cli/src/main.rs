mod config;
mod logging;
mod rf_cmd;
mod sstv_cmd;
mod terrain_grid;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;

use config::CliConfig;
use logging::StructuredLogger;
use tacfield_core::rfpath::ViewshedResolution;

/// CLI-facing wrapper so `tacfield-core` doesn't need a `clap` dependency
/// just to derive `ValueEnum`.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum ViewshedResolutionArg {
    Low,
    Medium,
    High,
}

impl From<ViewshedResolutionArg> for ViewshedResolution {
    fn from(arg: ViewshedResolutionArg) -> Self {
        match arg {
            ViewshedResolutionArg::Low => ViewshedResolution::Low,
            ViewshedResolutionArg::Medium => ViewshedResolution::Medium,
            ViewshedResolutionArg::High => ViewshedResolution::High,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "SSTV codec and RF path analysis toolkit", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file overriding engine defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode an image to an SSTV WAV file
    Encode {
        #[arg(long)]
        mode: String,
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Operator callsign; transmit refuses to run without one
        #[arg(long)]
        callsign: String,
        /// Acknowledge the operator holds a license to transmit
        #[arg(long)]
        license_ack: bool,
    },
    /// Decode an SSTV WAV file to an image
    Decode {
        #[arg(long)]
        wav: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Analyze a single point-to-point RF path
    Path {
        #[arg(long)]
        tx_lat: f64,
        #[arg(long)]
        tx_lon: f64,
        #[arg(long)]
        rx_lat: f64,
        #[arg(long)]
        rx_lon: f64,
        /// Flat elevation in feet, used when `--terrain-file` is absent
        #[arg(long, default_value_t = 1000.0)]
        terrain_feet: f64,
        /// CSV terrain grid (`lat,lon,elevation_feet` per line); overrides `--terrain-feet`
        #[arg(long)]
        terrain_file: Option<PathBuf>,
        #[arg(long, default_value_t = 146_000_000.0)]
        freq_hz: f64,
        #[arg(long, default_value_t = 37.0)]
        tx_power_dbm: f64,
        /// Minimum received signal the far-end radio can demodulate
        #[arg(long, default_value_t = -110.0)]
        rx_sensitivity_dbm: f64,
    },
    /// Sweep a radial viewshed around a point
    Viewshed {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        #[arg(long, default_value_t = 10_000.0)]
        radius_m: f64,
        /// Flat elevation in feet, used when `--terrain-file` is absent
        #[arg(long, default_value_t = 1000.0)]
        terrain_feet: f64,
        /// CSV terrain grid (`lat,lon,elevation_feet` per line); overrides `--terrain-feet`
        #[arg(long)]
        terrain_file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ViewshedResolutionArg::Medium)]
        resolution: ViewshedResolutionArg,
        #[arg(long, default_value_t = 146_000_000.0)]
        freq_hz: f64,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    let mut logger = StructuredLogger::new(config.logging.clone())?;

    match args.command {
        Command::Encode { mode, image, out, callsign, license_ack } => {
            sstv_cmd::encode(&mode, &image, &out, config.engine.sstv.sample_rate_hz, &callsign, license_ack, &mut logger)?;
        }
        Command::Decode { wav, out } => {
            sstv_cmd::decode(&wav, &out, &mut logger)?;
        }
        Command::Path { tx_lat, tx_lon, rx_lat, rx_lon, terrain_feet, terrain_file, freq_hz, tx_power_dbm, rx_sensitivity_dbm } => {
            rf_cmd::path(
                tx_lat, tx_lon, rx_lat, rx_lon, terrain_feet, terrain_file.as_deref(), freq_hz, tx_power_dbm,
                rx_sensitivity_dbm, &mut logger,
            )?;
        }
        Command::Viewshed { lat, lon, radius_m, terrain_feet, terrain_file, resolution, freq_hz } => {
            rf_cmd::viewshed(lat, lon, radius_m, terrain_feet, terrain_file.as_deref(), resolution.into(), freq_hz, &mut logger)?;
        }
    }

    Ok(())
}
