//! Edge detection from cardinal luma differences

use crate::core::error::ConfigError;
use crate::core::filter::{
    parse_argument, ArgumentKind, Category, FilterDescriptor, FilterMetadata, ParameterDefinition, PixelFilter,
};
use crate::core::iterator::{NeighborIterator, NeighborMode, PixelContext};
use crate::core::types::{luma, BandWriter, Channel, PixelBuffer, Rgba};
use crate::execution::progress::ProgressTracker;
use crate::filters::registry::FilterRegistry;

/// Default edge amplification.
pub const DEFAULT_EDGE_AMP: u32 = 1;

/// Register edge filters.
pub fn register<C: Channel>(registry: &mut FilterRegistry<C>) {
    registry.register::<Edge>();
}

/// Grayscale edge magnitude: `|N - S| + |W - E|` of neighbor luma, amplified.
///
/// Missing neighbors contribute zero. The result is clamped to the channel
/// maximum and written opaque.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    amp: u32,
}

impl Edge {
    /// Create an edge filter with amplification `amp`.
    pub fn new(amp: u32) -> Self {
        Self { amp }
    }

    /// Amplification factor.
    pub fn amp(&self) -> u32 {
        self.amp
    }

    /// Edge magnitude at one pixel, before clamping.
    pub fn magnitude<C: Channel>(&self, ctx: &PixelContext<C>) -> i64 {
        let level = |p: Option<Rgba<C>>| p.map(|p| luma(p) as i64).unwrap_or(0);
        let vertical = (level(ctx.north) - level(ctx.south)).abs();
        let horizontal = (level(ctx.west) - level(ctx.east)).abs();
        (vertical + horizontal).saturating_mul(self.amp as i64)
    }
}

impl Default for Edge {
    fn default() -> Self {
        Self::new(DEFAULT_EDGE_AMP)
    }
}

impl FilterDescriptor for Edge {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("edge", "Edge Detect")
            .description("Highlight luma differences between opposite neighbors")
            .category(Category::Edge)
            .neighbor_mode(NeighborMode::Direct)
            .parameter(
                ParameterDefinition::optional("amp", ArgumentKind::Integer, DEFAULT_EDGE_AMP.to_string())
                    .with_description("Amplification factor (non-negative)"),
            )
            .build()
    }

    fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let amp = parse_argument::<u32>("edge", args, 0, "amp")?.unwrap_or(DEFAULT_EDGE_AMP);
        Ok(Self::new(amp))
    }
}

impl<C: Channel> PixelFilter<C> for Edge {
    fn id(&self) -> &'static str {
        "edge"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        let max = C::max_u32() as i64;

        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::Direct).with_progress(progress) {
            let value = C::from_u32_saturating(self.magnitude(&ctx).clamp(0, max) as u32);
            target.put_pixel(ctx.x, ctx.y, Rgba([value, value, value, C::MAX]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin::{run_filter, run_filter_banded};

    #[test]
    fn test_flat_image_has_no_interior_edges() {
        let image = PixelBuffer::filled(5, 5, Rgba([90u8, 90, 90, 12]));
        let edges = run_filter(&Edge::default(), &image);

        assert_eq!(edges.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
        // Missing neighbors count as black.
        assert_eq!(edges.get_pixel(0, 2), Rgba([90, 90, 90, 255]));
        assert_eq!(edges.get_pixel(0, 0), Rgba([180, 180, 180, 255]));
    }

    #[test]
    fn test_vertical_step_edge() {
        let image = PixelBuffer::from_fn(6, 3, |x, _| if x < 3 { Rgba([0u8, 0, 0, 255]) } else { Rgba([50, 50, 50, 255]) });
        let edges = run_filter(&Edge::new(2), &image);

        assert_eq!(edges.get_pixel(2, 1), Rgba([100, 100, 100, 255]));
        assert_eq!(edges.get_pixel(3, 1), Rgba([100, 100, 100, 255]));
        assert_eq!(edges.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_amplified_edges_clamp() {
        let image = PixelBuffer::from_fn(3, 1, |x, _| if x == 0 { Rgba([0u16, 0, 0, 0]) } else { Rgba([65535, 65535, 65535, 0]) });
        let edges = run_filter(&Edge::new(1000), &image);
        assert_eq!(edges.get_pixel(1, 0), Rgba([65535, 65535, 65535, 65535]));
    }

    #[test]
    fn test_edge_band_count_independent() {
        let image = PixelBuffer::<u8>::from_fn(5, 8, |x, y| Rgba([(x * y * 7) as u8, 3, (y * 30) as u8, 255]));
        let whole = run_filter(&Edge::new(3), &image);
        assert_eq!(run_filter_banded(&Edge::new(3), &image, 3), whole);
    }

    #[test]
    fn test_edge_args() {
        assert_eq!(Edge::from_args(&[]).unwrap().amp(), 1);
        assert_eq!(Edge::from_args(&["4".to_string()]).unwrap().amp(), 4);
        assert!(Edge::from_args(&["-2".to_string()]).is_err());
    }
}
