//! # tailfeed audio output bridge (tailfeed-out)
//!
//! Connects a pull-model audio device to a producer that fills fixed-size
//! buffers on its own schedule.
//!
//! **Purpose:** Serve every hardware request of arbitrary size from a
//! double-buffered primary buffer plus a spill-over tail store, and refill
//! the primary buffer off the real-time thread.
//!
//! **Architecture:** `RenderEngine` runs inside the device callback (cpal or
//! the offline driver); `AudioSession` owns the stream, the refill side and
//! the refill worker thread.

pub mod buffer;
pub mod config;
pub mod error;
pub mod output;
pub mod refill;
pub mod render;
pub mod session;
pub mod tone;

pub use config::{RefillContext, SessionConfig, StreamParams};
pub use error::{Error, Result};
pub use output::{CpalBackend, OfflineBackend, OfflineDriver, OutputBackend};
pub use render::{Interleaved, Planar, RenderEngine, RenderTarget, StatsSnapshot};
pub use session::{AudioSession, SessionState};
pub use tone::SineTone;
