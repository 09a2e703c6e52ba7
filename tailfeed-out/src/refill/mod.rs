//! Refill path: the coalescing trigger and the context that runs the producer

pub mod trigger;
pub mod worker;

pub use trigger::RefillTrigger;
pub use worker::{Producer, RefillWorker, Refiller};
