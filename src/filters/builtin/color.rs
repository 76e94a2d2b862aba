//! Color mapping filters: Invert, Comic (posterize), Heat

use crate::core::error::ConfigError;
use crate::core::filter::{
    invalid_argument, parse_argument, ArgumentKind, Category, FilterDescriptor, FilterMetadata,
    ParameterDefinition, PixelFilter,
};
use crate::core::iterator::{NeighborIterator, NeighborMode};
use crate::core::types::{luma, BandWriter, Channel, PixelBuffer, Rgba};
use crate::execution::progress::ProgressTracker;
use crate::filters::registry::FilterRegistry;

/// Default number of gray levels for [`Comic`].
pub const DEFAULT_COMIC_STEPS: u32 = 3;

/// Luma width of one heat bucket, in 8-bit levels.
pub const HEAT_LEVEL_STEP: u32 = 42;

/// RGB on/off bits per heat bucket, cold to hot.
pub const HEAT_PALETTE: [u8; 6] = [0b000, 0b001, 0b011, 0b010, 0b110, 0b100];

/// Register color filters.
pub fn register<C: Channel>(registry: &mut FilterRegistry<C>) {
    registry.register::<Invert>();
    registry.register::<Comic>();
    registry.register::<Heat>();
}

/// Inverts the RGB channels, keeping alpha.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl FilterDescriptor for Invert {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("invert", "Invert")
            .description("Invert every color channel, keeping alpha")
            .category(Category::Color)
            .build()
    }

    fn from_args(_args: &[String]) -> Result<Self, ConfigError> {
        Ok(Invert)
    }
}

impl<C: Channel> PixelFilter<C> for Invert {
    fn id(&self) -> &'static str {
        "invert"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        let max = C::max_u32();
        let invert = |v: C| C::from_u32_saturating(max - v.to_u32());

        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::None).with_progress(progress) {
            let [r, g, b, a] = ctx.pixel.0;
            target.put_pixel(ctx.x, ctx.y, Rgba([invert(r), invert(g), invert(b), a]));
        }
    }
}

/// Posterizes luma into a fixed number of gray levels.
#[derive(Debug, Clone, Copy)]
pub struct Comic {
    steps: u32,
}

impl Comic {
    /// Create a posterize filter with `steps` gray levels.
    pub fn new(steps: u32) -> Self {
        Self { steps: steps.max(1) }
    }

    /// Number of gray levels.
    pub fn steps(&self) -> u32 {
        self.steps
    }
}

impl Default for Comic {
    fn default() -> Self {
        Self::new(DEFAULT_COMIC_STEPS)
    }
}

impl FilterDescriptor for Comic {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("comic", "Comic")
            .description("Posterize the image into a few flat gray levels")
            .category(Category::Color)
            .parameter(
                ParameterDefinition::optional("steps", ArgumentKind::Integer, DEFAULT_COMIC_STEPS.to_string())
                    .with_description("Number of gray levels (at least 1)"),
            )
            .build()
    }

    fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let steps = parse_argument::<u32>("comic", args, 0, "steps")?.unwrap_or(DEFAULT_COMIC_STEPS);
        if steps == 0 {
            return Err(invalid_argument("comic", "steps", steps, "must be at least 1"));
        }
        Ok(Self::new(steps))
    }
}

impl<C: Channel> PixelFilter<C> for Comic {
    fn id(&self) -> &'static str {
        "comic"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        let color_step = (C::max_u32() / self.steps).max(1);
        let color_offset = color_step / 2;
        let color_step_f = color_step as f64;

        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::None).with_progress(progress) {
            // Truncated steps leave a sliver above the top level; fold it in.
            let level = ((luma(ctx.pixel) / color_step_f).floor() as u32).min(self.steps - 1);
            let gray = C::from_u32_saturating(level.saturating_mul(color_step).saturating_add(color_offset));
            target.put_pixel(ctx.x, ctx.y, Rgba([gray, gray, gray, C::MAX]));
        }
    }
}

/// Maps luma onto a six-color heat gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heat;

impl Heat {
    /// Heat color for a pixel.
    pub fn color<C: Channel>(pixel: Rgba<C>) -> Rgba<C> {
        let step = (HEAT_LEVEL_STEP * C::scale_from_8bit()) as f64;
        let bucket = ((luma(pixel) / step).floor() as usize).min(HEAT_PALETTE.len() - 1);
        let bits = HEAT_PALETTE[bucket];
        let channel = |mask: u8| if bits & mask != 0 { C::MAX } else { C::default() };

        Rgba([channel(0b100), channel(0b010), channel(0b001), C::MAX])
    }
}

impl FilterDescriptor for Heat {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("heat", "Heat Map")
            .description("Map brightness onto a six step heat gradient")
            .category(Category::Color)
            .build()
    }

    fn from_args(_args: &[String]) -> Result<Self, ConfigError> {
        Ok(Heat)
    }
}

impl<C: Channel> PixelFilter<C> for Heat {
    fn id(&self) -> &'static str {
        "heat"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::None).with_progress(progress) {
            target.put_pixel(ctx.x, ctx.y, Heat::color(ctx.pixel));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin::run_filter;
    use std::collections::BTreeSet;

    #[test]
    fn test_invert_round_trip() {
        let image = PixelBuffer::<u8>::from_fn(5, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 17, 99]));
        let once = run_filter(&Invert, &image);
        let twice = run_filter(&Invert, &once);

        assert_eq!(once.get_pixel(1, 2), Rgba([215, 135, 238, 99]));
        assert_eq!(twice, image);
    }

    #[test]
    fn test_invert_16bit_keeps_alpha() {
        let image = PixelBuffer::<u16>::filled(2, 2, Rgba([0, 1000, 65535, 1234]));
        let inverted = run_filter(&Invert, &image);
        assert_eq!(inverted.get_pixel(1, 1), Rgba([65535, 64535, 0, 1234]));
    }

    #[test]
    fn test_comic_levels() {
        let image = PixelBuffer::<u8>::from_fn(3, 1, |x, _| {
            let v = [0u8, 128, 250][x as usize];
            Rgba([v, v, v, 10])
        });
        let posterized = run_filter(&Comic::default(), &image);

        // step 85, offset 42
        assert_eq!(posterized.get_pixel(0, 0), Rgba([42, 42, 42, 255]));
        assert_eq!(posterized.get_pixel(1, 0), Rgba([127, 127, 127, 255]));
        assert_eq!(posterized.get_pixel(2, 0), Rgba([212, 212, 212, 255]));
    }

    fn distinct_gray_levels<C: Channel + Ord>(image: &PixelBuffer<C>) -> BTreeSet<C> {
        let (width, height) = image.dimensions();
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| image.get_pixel(x, y).0[0])
            .collect()
    }

    #[test]
    fn test_comic_produces_exactly_steps_levels() {
        let ramp8 = PixelBuffer::<u8>::from_fn(256, 1, |x, _| Rgba([x as u8, x as u8, x as u8, 255]));
        let ramp16 = PixelBuffer::<u16>::from_fn(256, 256, |x, y| {
            let v = (y * 256 + x) as u16;
            Rgba([v, v, v, 65535])
        });

        for steps in [1u32, 2, 3, 4, 7] {
            let levels = distinct_gray_levels(&run_filter(&Comic::new(steps), &ramp8));
            assert_eq!(levels.len(), steps as usize, "8-bit steps={}: {:?}", steps, levels);
            assert!(levels.iter().all(|&v| v < 255), "8-bit steps={}: {:?}", steps, levels);

            let levels = distinct_gray_levels(&run_filter(&Comic::new(steps), &ramp16));
            assert_eq!(levels.len(), steps as usize, "16-bit steps={}", steps);
            assert!(levels.iter().all(|&v| v < 65535), "16-bit steps={}", steps);
        }
    }

    #[test]
    fn test_comic_scales_to_16bit() {
        let image = PixelBuffer::<u16>::filled(1, 1, Rgba([0, 0, 0, 0]));
        let posterized = run_filter(&Comic::new(3), &image);
        assert_eq!(posterized.get_pixel(0, 0), Rgba([10922, 10922, 10922, 65535]));
    }

    #[test]
    fn test_comic_args() {
        assert_eq!(Comic::from_args(&[]).unwrap().steps(), 3);
        assert_eq!(Comic::from_args(&["5".to_string()]).unwrap().steps(), 5);
        assert!(Comic::from_args(&["0".to_string()]).is_err());
        assert!(Comic::from_args(&["many".to_string()]).is_err());
    }

    #[test]
    fn test_heat_buckets() {
        let gray = |v: u8| Rgba([v, v, v, 0]);
        assert_eq!(Heat::color(gray(0)), Rgba([0, 0, 0, 255]));
        assert_eq!(Heat::color(gray(42)), Rgba([0, 0, 255, 255]));
        assert_eq!(Heat::color(gray(90)), Rgba([0, 255, 255, 255]));
        assert_eq!(Heat::color(gray(130)), Rgba([0, 255, 0, 255]));
        assert_eq!(Heat::color(gray(170)), Rgba([255, 255, 0, 255]));
        assert_eq!(Heat::color(gray(250)), Rgba([255, 0, 0, 255]));
        assert_eq!(Heat::color(gray(255)), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_heat_16bit_saturates_channels() {
        let hot = Heat::color(Rgba([65535u16, 65535, 65535, 0]));
        assert_eq!(hot, Rgba([65535, 0, 0, 65535]));

        let warm = Heat::color(Rgba([170u16 * 257, 170 * 257, 170 * 257, 0]));
        assert_eq!(warm, Rgba([65535, 65535, 0, 65535]));
    }
}
