//! The SSTV codec: VIS handshake, line scanning, slant/drift tracking,
//! tone synthesis, and the receive/transmit engine (`spec.md` §1-§9, modules A-F).

pub mod channel;
pub mod decoder;
pub mod events;
pub mod modes;
pub mod raster;
pub mod scanner;
pub mod synth;
pub mod tone;
pub mod tracker;
pub mod vis;

pub use decoder::{DecoderPhase, DecoderState, SstvEngine};
pub use events::{ChannelSink, EventSink, NullSink, SstvEvent};
pub use modes::{mode_by_name, mode_by_vis_code, ColorModel, ModeDescriptor, MODES};
pub use raster::Raster;
