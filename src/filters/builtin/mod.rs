//! Built-in filter implementations.
//!
//! This module contains the standard filters that ship with Rasterband.

mod blur;
mod color;
mod edge;
mod spot;

use crate::core::types::Channel;
use crate::filters::registry::FilterRegistry;

/// Register all built-in filters.
pub fn register_all<C: Channel>(registry: &mut FilterRegistry<C>) {
    color::register(registry);
    blur::register(registry);
    edge::register(registry);
    spot::register(registry);
}

// Re-export for direct access
pub use blur::{Blur, GaussianBlur, DEFAULT_GAUSSIAN_RADIUS, DEFAULT_GAUSSIAN_SIGMA, MAX_GAUSSIAN_RADIUS};
pub use color::{Comic, Heat, Invert, DEFAULT_COMIC_STEPS, HEAT_LEVEL_STEP, HEAT_PALETTE};
pub use edge::{Edge, DEFAULT_EDGE_AMP};
pub use spot::Spot;

#[cfg(test)]
use crate::core::{
    band::{RowBand, RowBands},
    filter::PixelFilter,
    types::PixelBuffer,
};
#[cfg(test)]
use crate::execution::progress::ProgressTracker;

/// Apply `filter` once over the whole image as a single band.
#[cfg(test)]
pub(crate) fn run_filter<C: Channel, F: PixelFilter<C>>(filter: &F, source: &PixelBuffer<C>) -> PixelBuffer<C> {
    let mut target = source.clone();
    let tracker = ProgressTracker::new(source.height() as u64);
    for mut writer in target.split_bands_mut(&[RowBand::new(0, source.height())]) {
        filter.apply(source, &mut writer, &tracker);
    }
    target
}

/// Apply `filter` once, band by band, with `band_count` bands.
#[cfg(test)]
pub(crate) fn run_filter_banded<C: Channel, F: PixelFilter<C>>(
    filter: &F,
    source: &PixelBuffer<C>,
    band_count: usize,
) -> PixelBuffer<C> {
    let mut target = source.clone();
    let tracker = ProgressTracker::new(source.height() as u64);
    let bands: Vec<RowBand> = RowBands::new(source.height(), band_count).collect();
    for mut writer in target.split_bands_mut(&bands) {
        filter.apply(source, &mut writer, &tracker);
    }
    target
}
