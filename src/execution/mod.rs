//! Execution engine module.
//!
//! This module runs a filter over an image, band-parallel and iterated.

pub mod dynamic;
pub mod engine;
pub mod progress;

pub use dynamic::DynamicEngine;
pub use engine::{EngineOptions, EngineState, FilterEngine, RunStats};
pub use progress::{ProgressTracker, ProgressUpdate};
