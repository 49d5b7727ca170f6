//! The 14-mode SSTV descriptor table (`spec.md` §3, §6).

/// Per-mode color model and sub-scan timing. The two "orthogonal flags"
/// named in `spec.md` §3 (`chroma_paired` vs line-pair) are expressed here
/// as distinct variants rather than booleans, since each implies a
/// different sub-scan sequence (§4.C).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorModel {
    /// Martin family: Sync -> Porch -> G -> Separator -> B -> Separator -> R.
    Gbr { separator_ms: f64 },
    /// Wraase SC2-180: Sync -> Porch -> R -> Separator -> G -> Separator -> B.
    Rgb { separator_ms: f64 },
    /// Robot 36: Y row, then a single chroma row per sync — Cr on even
    /// lines, Cb on odd lines (no inter-chroma separator since only one
    /// chroma channel is sent per line).
    YCrCbAlternating { chroma_ms: f64, separator_ms: f64 },
    /// Robot 72: Y row, then Cr, separator, Cb — both chroma channels every
    /// line.
    YCrCbPerLine { chroma_ms: f64, separator_ms: f64 },
    /// PD family: Y0, Y1, Cr, Cb per sync pulse; both image rows share the
    /// same chroma pair. Each sync advances the line pointer by 2.
    YCrCbLinePair {
        chroma_ms: f64,
        separator_ms: f64,
        chroma_porch_ms: Option<f64>,
    },
}

impl ColorModel {
    /// `true` for the PD family (line-pair assembly, two rows per sync).
    pub fn is_line_pair(&self) -> bool {
        matches!(self, ColorModel::YCrCbLinePair { .. })
    }

    /// Number of output raster rows produced per sync pulse.
    pub fn rows_per_sync(&self) -> usize {
        if self.is_line_pair() {
            2
        } else {
            1
        }
    }
}

/// An immutable per-mode record (`spec.md` §3 "Mode descriptor").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeDescriptor {
    pub name: &'static str,
    pub vis_code: u8,
    pub width: usize,
    pub height: usize,
    pub color_model: ColorModel,
    pub sync_ms: f64,
    pub porch_ms: f64,
    /// Y-scan time for YCrCb modes; per-channel scan time for GBR/RGB modes.
    pub scan_ms: f64,
}

impl ModeDescriptor {
    /// Wall-clock time to transmit one sync-to-sync line (or line pair for
    /// the PD family), in milliseconds.
    pub fn line_time_ms(&self) -> f64 {
        let base = self.sync_ms + self.porch_ms + self.scan_ms;
        match self.color_model {
            ColorModel::Gbr { separator_ms } | ColorModel::Rgb { separator_ms } => {
                base + 2.0 * separator_ms + 2.0 * self.scan_ms
            }
            ColorModel::YCrCbAlternating { chroma_ms, separator_ms } => {
                base + separator_ms + chroma_ms
            }
            ColorModel::YCrCbPerLine { chroma_ms, separator_ms } => {
                base + separator_ms + chroma_ms + separator_ms + chroma_ms
            }
            ColorModel::YCrCbLinePair {
                chroma_ms,
                chroma_porch_ms,
                ..
            } => base + self.scan_ms + 2.0 * chroma_ms + chroma_porch_ms.unwrap_or(0.0),
        }
    }

    /// Nominal total transmission time, in seconds.
    pub fn nominal_total_seconds(&self) -> f64 {
        let syncs = self.height / self.color_model.rows_per_sync();
        (syncs as f64 * self.line_time_ms()) / 1000.0
    }
}

macro_rules! gbr {
    ($separator:expr) => {
        ColorModel::Gbr { separator_ms: $separator }
    };
}

macro_rules! rgb {
    ($separator:expr) => {
        ColorModel::Rgb { separator_ms: $separator }
    };
}

/// All 14 supported modes, ordered by VIS code table appearance in
/// `spec.md` §6. PD-180 uses `0x60` per the resolved open question (§9, §12).
pub const MODES: &[ModeDescriptor] = &[
    ModeDescriptor {
        name: "Robot36",
        vis_code: 0x08,
        width: 320,
        height: 240,
        color_model: ColorModel::YCrCbAlternating { chroma_ms: 44.0, separator_ms: 4.5 },
        sync_ms: 9.0,
        porch_ms: 3.0,
        scan_ms: 88.0,
    },
    ModeDescriptor {
        name: "Robot72",
        vis_code: 0x0C,
        width: 320,
        height: 240,
        color_model: ColorModel::YCrCbPerLine { chroma_ms: 69.0, separator_ms: 4.5 },
        sync_ms: 9.0,
        porch_ms: 3.0,
        scan_ms: 138.0,
    },
    ModeDescriptor {
        name: "MartinM1",
        vis_code: 0x2C,
        width: 320,
        height: 256,
        color_model: gbr!(0.572),
        sync_ms: 4.862,
        porch_ms: 0.572,
        scan_ms: 146.432,
    },
    ModeDescriptor {
        name: "MartinM2",
        vis_code: 0x28,
        width: 320,
        height: 256,
        color_model: gbr!(0.572),
        sync_ms: 4.862,
        porch_ms: 0.572,
        scan_ms: 73.216,
    },
    ModeDescriptor {
        name: "ScottieS1",
        vis_code: 0x3C,
        width: 320,
        height: 256,
        color_model: gbr!(1.5),
        sync_ms: 9.0,
        porch_ms: 1.5,
        scan_ms: 138.240,
    },
    ModeDescriptor {
        name: "ScottieS2",
        vis_code: 0x38,
        width: 320,
        height: 256,
        color_model: gbr!(1.5),
        sync_ms: 9.0,
        porch_ms: 1.5,
        scan_ms: 88.064,
    },
    ModeDescriptor {
        name: "ScottieDX",
        vis_code: 0x71,
        width: 320,
        height: 256,
        color_model: gbr!(1.5),
        sync_ms: 9.0,
        porch_ms: 1.5,
        scan_ms: 345.600,
    },
    ModeDescriptor {
        name: "PD50",
        vis_code: 0x5D,
        width: 320,
        height: 256,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 91.52,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 91.52,
    },
    ModeDescriptor {
        name: "PD90",
        vis_code: 0x63,
        width: 320,
        height: 256,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 170.667,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 170.667,
    },
    ModeDescriptor {
        name: "PD120",
        vis_code: 0x5F,
        width: 640,
        height: 496,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 121.6,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 121.6,
    },
    ModeDescriptor {
        name: "PD160",
        vis_code: 0x61,
        width: 512,
        height: 400,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 195.584,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 195.584,
    },
    ModeDescriptor {
        name: "PD180",
        vis_code: 0x60,
        width: 640,
        height: 496,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 183.04,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 183.04,
    },
    ModeDescriptor {
        name: "PD240",
        vis_code: 0x62,
        width: 640,
        height: 496,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 244.48,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 244.48,
    },
    ModeDescriptor {
        name: "PD290",
        vis_code: 0x64,
        width: 800,
        height: 616,
        color_model: ColorModel::YCrCbLinePair {
            chroma_ms: 228.8,
            separator_ms: 0.0,
            chroma_porch_ms: None,
        },
        sync_ms: 20.0,
        porch_ms: 2.08,
        scan_ms: 228.8,
    },
    ModeDescriptor {
        name: "WraaseSC2180",
        vis_code: 0x55,
        width: 320,
        height: 256,
        color_model: rgb!(0.5),
        sync_ms: 5.5225,
        porch_ms: 0.5,
        scan_ms: 232.042,
    },
];

/// Look up a mode descriptor by its 8-bit VIS code.
pub fn mode_by_vis_code(code: u8) -> Option<&'static ModeDescriptor> {
    MODES.iter().find(|m| m.vis_code == code)
}

/// Look up a mode descriptor by display name.
pub fn mode_by_name(name: &str) -> Option<&'static ModeDescriptor> {
    MODES.iter().find(|m| m.name == name)
}
