//! Core types and traits for Rasterband.
//!
//! This module contains the building blocks the engine and filters share:
//! - Pixel model (channels, buffers, band writers)
//! - Row band partitioning
//! - Neighbor iteration and kernel sampling
//! - The filter trait and its metadata
//! - Error types and run configuration

pub mod band;
pub mod config;
pub mod error;
pub mod filter;
pub mod iterator;
pub mod kernel;
pub mod types;

// Re-export commonly used types
pub use band::{RowBand, RowBands};
pub use config::{RunConfig, RunPlan};
pub use error::{ConfigError, RasterError, RasterResult};
pub use filter::{Category, FilterDescriptor, FilterMetadata, PixelFilter};
pub use iterator::{NeighborIterator, NeighborMode, PixelContext};
pub use kernel::{BorderMode, Kernel, Window};
pub use types::{BandWriter, Channel, ChannelDepth, DynamicBuffer, PixelBuffer, Rgba};
