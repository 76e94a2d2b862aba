//! # Rasterband - Band-parallel image filtering
//!
//! Rasterband applies per-pixel and neighborhood filters (box blur, Gaussian
//! blur, edge detection, spot light, posterize, invert, heat map) to 8-bit or
//! 16-bit RGBA images, splitting every pass into row bands that run in
//! parallel and chaining repeated passes through a double buffer.
//!
//! ## Features
//!
//! - **Band Parallelism**: Each iteration splits the image into disjoint row bands, one rayon task per band
//! - **Iterated Filters**: `run(n)` applies a filter `n` times, each pass reading the fully written previous pass
//! - **Neighbor Iteration**: Row-cached access to the four direct neighbors, absent at the image edge
//! - **Convolution Kernels**: Normalized Gaussian kernels with mirrored or renormalized borders
//! - **Two Depths**: Every filter is generic over 8-bit and 16-bit channels
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rasterband::prelude::*;
//!
//! let image = rasterband::io::read_image("input.png")?;
//! let mut engine = DynamicEngine::new(image, EngineOptions::new().with_band_count(16));
//!
//! engine.set_filter("gaussianblur", &["3".to_string(), "1.5".to_string()])?;
//! engine.run(2)?;
//! engine.write_output("input_gaussianblur.png")?;
//! # Ok::<(), rasterband::core::error::RasterError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Pixel model, row bands, neighbor iterator, kernels, the filter trait and errors
//! - [`filters`]: Filter registry and built-in filters
//! - [`execution`]: Band-parallel engine and progress tracking
//! - [`io`]: Image decode and atomic PNG encode
//! - [`cli`]: Command-line parsing for the `rasterband` binary
//!
//! ## Creating Custom Filters
//!
//! Implement [`PixelFilter`](core::filter::PixelFilter) for every channel type
//! and [`FilterDescriptor`](core::filter::FilterDescriptor) to make the filter
//! resolvable by name:
//!
//! ```rust
//! use rasterband::prelude::*;
//!
//! struct Darken;
//!
//! impl FilterDescriptor for Darken {
//!     fn metadata() -> FilterMetadata {
//!         FilterMetadata::builder("darken", "Darken")
//!             .description("Halve every color channel")
//!             .build()
//!     }
//!
//!     fn from_args(_args: &[String]) -> Result<Self, ConfigError> {
//!         Ok(Darken)
//!     }
//! }
//!
//! impl<C: Channel> PixelFilter<C> for Darken {
//!     fn id(&self) -> &'static str {
//!         "darken"
//!     }
//!
//!     fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
//!         for ctx in NeighborIterator::new(source, target.band(), NeighborMode::None).with_progress(progress) {
//!             let [r, g, b, a] = ctx.pixel.0;
//!             let half = |v: C| C::from_u32_saturating(v.to_u32() / 2);
//!             target.put_pixel(ctx.x, ctx.y, Rgba([half(r), half(g), half(b), a]));
//!         }
//!     }
//! }
//!
//! let mut registry = FilterRegistry::<u8>::with_builtins();
//! registry.register::<Darken>();
//! assert!(registry.contains("darken"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod core;
pub mod execution;
pub mod filters;
pub mod io;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use rasterband::prelude::*;
/// ```
pub mod prelude {
    // Pixel model
    pub use crate::core::band::{RowBand, RowBands};
    pub use crate::core::types::{BandWriter, Channel, ChannelDepth, DynamicBuffer, PixelBuffer, Rgba};

    // Iteration and kernels
    pub use crate::core::iterator::{NeighborIterator, NeighborMode, PixelContext};
    pub use crate::core::kernel::{sample_window, BorderMode, Kernel, Window};

    // Filter trait and metadata
    pub use crate::core::filter::{
        ArgumentKind, Category, FilterDescriptor, FilterMetadata, ParameterDefinition, PixelFilter,
    };

    // Errors and configuration
    pub use crate::core::config::{RunConfig, RunPlan};
    pub use crate::core::error::{ConfigError, RasterError, RasterResult};

    // Execution
    pub use crate::execution::dynamic::DynamicEngine;
    pub use crate::execution::engine::{EngineOptions, EngineState, FilterEngine, RunStats};
    pub use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};

    // Filters
    pub use crate::filters::builtin::{Blur, Comic, Edge, GaussianBlur, Heat, Invert, Spot};
    pub use crate::filters::registry::{FilterFactory, FilterRegistry, RegistryEntry};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
