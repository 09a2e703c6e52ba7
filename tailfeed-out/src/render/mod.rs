//! Real-time render path

pub mod engine;
pub mod stats;
pub mod tail;
pub mod target;

pub use engine::RenderEngine;
pub use stats::{RenderStats, StatsSnapshot};
pub use tail::TailStore;
pub use target::{Interleaved, Planar, RenderTarget};
