//! Core SSTV codec and RF path analysis engines for an offline-first
//! tactical field application.
//!
//! Two independent subsystems live here: [`sstv`] (a streaming SSTV
//! encoder/decoder) and [`rfpath`] (line-of-sight and link-budget
//! analysis). They share only ambient infrastructure — [`errors`],
//! [`logging`], [`settings`], [`utils`] — and never call into one another.

pub mod config;
pub mod errors;
pub mod logging;
pub mod rfpath;
pub mod settings;
pub mod sstv;
pub mod utils;

pub use config::EngineConfig;
pub use errors::{Result, RfError, SstvError, TacFieldError};
