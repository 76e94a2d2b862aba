//! Blur filters: 4-neighbor box blur and Gaussian blur

use crate::core::error::ConfigError;
use crate::core::filter::{
    invalid_argument, parse_argument, ArgumentKind, Category, FilterDescriptor, FilterMetadata,
    ParameterDefinition, PixelFilter,
};
use crate::core::iterator::{NeighborIterator, NeighborMode};
use crate::core::kernel::{BorderMode, Kernel, Window};
use crate::core::types::{BandWriter, Channel, PixelBuffer, Rgba};
use crate::execution::progress::ProgressTracker;
use crate::filters::registry::FilterRegistry;

/// Default Gaussian kernel radius.
pub const DEFAULT_GAUSSIAN_RADIUS: u32 = 5;

/// Default Gaussian spread.
pub const DEFAULT_GAUSSIAN_SIGMA: f64 = 1.0;

/// Largest accepted Gaussian radius.
pub const MAX_GAUSSIAN_RADIUS: u32 = 64;

/// Register blur filters.
pub fn register<C: Channel>(registry: &mut FilterRegistry<C>) {
    registry.register::<Blur>();
    registry.register::<GaussianBlur>();
}

/// Averages each pixel with its present cardinal neighbors.
///
/// All four channels are averaged with integer division, so a pixel on the
/// image edge averages over fewer samples rather than treating missing
/// neighbors as black.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blur;

impl FilterDescriptor for Blur {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("blur", "Box Blur")
            .description("Average every pixel with its four direct neighbors")
            .category(Category::Blur)
            .neighbor_mode(NeighborMode::Direct)
            .build()
    }

    fn from_args(_args: &[String]) -> Result<Self, ConfigError> {
        Ok(Blur)
    }
}

impl<C: Channel> PixelFilter<C> for Blur {
    fn id(&self) -> &'static str {
        "blur"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::Direct).with_progress(progress) {
            let mut sums = ctx.pixel.0.map(|v| v.to_u32());
            let mut count = 1u32;

            for neighbor in ctx.neighbors() {
                for (sum, value) in sums.iter_mut().zip(neighbor.0) {
                    *sum += value.to_u32();
                }
                count += 1;
            }

            target.put_pixel(ctx.x, ctx.y, Rgba(sums.map(|sum| C::from_u32_saturating(sum / count))));
        }
    }
}

/// Convolves the image with a normalized Gaussian kernel.
#[derive(Debug, Clone)]
pub struct GaussianBlur {
    kernel: Kernel,
    border: BorderMode,
}

impl GaussianBlur {
    /// Create a Gaussian blur with mirrored borders.
    pub fn new(radius: u32, sigma: f64) -> Self {
        Self::with_border(radius, sigma, BorderMode::Mirror)
    }

    /// Create a Gaussian blur with an explicit border mode.
    pub fn with_border(radius: u32, sigma: f64, border: BorderMode) -> Self {
        Self {
            kernel: Kernel::gaussian(radius, sigma),
            border,
        }
    }

    /// The convolution kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Border handling.
    pub fn border(&self) -> BorderMode {
        self.border
    }
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self::new(DEFAULT_GAUSSIAN_RADIUS, DEFAULT_GAUSSIAN_SIGMA)
    }
}

impl FilterDescriptor for GaussianBlur {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("gaussianblur", "Gaussian Blur")
            .description("Convolve with a normalized Gaussian kernel, mirroring at the borders")
            .category(Category::Blur)
            .parameter(
                ParameterDefinition::optional("radius", ArgumentKind::Integer, DEFAULT_GAUSSIAN_RADIUS.to_string())
                    .with_description("Kernel radius in pixels; the kernel side is 2 * radius + 1"),
            )
            .parameter(
                ParameterDefinition::optional("sigma", ArgumentKind::Float, "1.0")
                    .with_description("Standard deviation of the Gaussian"),
            )
            .parameter(
                ParameterDefinition::optional("border", ArgumentKind::Word, BorderMode::Mirror.name())
                    .with_description("Border handling: mirror or none"),
            )
            .build()
    }

    fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let radius = parse_argument::<u32>("gaussianblur", args, 0, "radius")?.unwrap_or(DEFAULT_GAUSSIAN_RADIUS);
        if radius > MAX_GAUSSIAN_RADIUS {
            return Err(invalid_argument(
                "gaussianblur",
                "radius",
                radius,
                &format!("must be at most {}", MAX_GAUSSIAN_RADIUS),
            ));
        }

        let sigma = parse_argument::<f64>("gaussianblur", args, 1, "sigma")?.unwrap_or(DEFAULT_GAUSSIAN_SIGMA);
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(invalid_argument("gaussianblur", "sigma", sigma, "must be a positive number"));
        }

        let border = match args.get(2) {
            None => BorderMode::Mirror,
            Some(name) => BorderMode::from_name(name)
                .ok_or_else(|| invalid_argument("gaussianblur", "border", name, "expected 'mirror' or 'none'"))?,
        };

        Ok(Self::with_border(radius, sigma, border))
    }
}

impl<C: Channel> PixelFilter<C> for GaussianBlur {
    fn id(&self) -> &'static str {
        "gaussianblur"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        let mut window = Window::new(self.kernel.size());

        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::None).with_progress(progress) {
            window.fill(source, ctx.x, ctx.y, self.border);
            target.put_pixel(ctx.x, ctx.y, self.kernel.apply(&window));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin::{run_filter, run_filter_banded};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn red_with_blue_dot() -> PixelBuffer<u8> {
        let mut image = PixelBuffer::filled(4, 4, RED);
        image.put_pixel(1, 1, BLUE);
        image
    }

    #[test]
    fn test_blur_averages_present_neighbors() {
        let blurred = run_filter(&Blur, &red_with_blue_dot());

        assert_eq!(blurred.get_pixel(1, 1), Rgba([204, 0, 51, 255]));
        assert_eq!(blurred.get_pixel(1, 0), Rgba([191, 0, 63, 255]));
        assert_eq!(blurred.get_pixel(0, 0), RED);
        assert_eq!(blurred.get_pixel(3, 3), RED);
    }

    #[test]
    fn test_blur_corner_uses_three_samples() {
        let mut image = PixelBuffer::filled(3, 3, Rgba([0u16, 0, 0, 0]));
        image.put_pixel(0, 0, Rgba([300, 600, 900, 65535]));
        let blurred = run_filter(&Blur, &image);
        assert_eq!(blurred.get_pixel(0, 0), Rgba([100, 200, 300, 21845]));
    }

    #[test]
    fn test_blur_band_count_independent() {
        let image = PixelBuffer::<u8>::from_fn(7, 9, |x, y| Rgba([(x * 31) as u8, (y * 17) as u8, (x ^ y) as u8, 200]));
        let whole = run_filter(&Blur, &image);
        for bands in [2, 3, 9, 20] {
            assert_eq!(run_filter_banded(&Blur, &image, bands), whole, "{} bands", bands);
        }
    }

    #[test]
    fn test_gaussian_zero_radius_is_identity() {
        let image = red_with_blue_dot();
        assert_eq!(run_filter(&GaussianBlur::new(0, 1.0), &image), image);
    }

    #[test]
    fn test_gaussian_keeps_uniform_image() {
        let image = PixelBuffer::filled(6, 5, Rgba([10u16, 2000, 40000, 65535]));
        for border in [BorderMode::Mirror, BorderMode::None] {
            let blurred = run_filter(&GaussianBlur::with_border(3, 1.5, border), &image);
            assert_eq!(blurred, image);
        }
    }

    #[test]
    fn test_gaussian_spreads_dot_symmetrically() {
        let mut image = PixelBuffer::filled(9, 9, Rgba([0u8, 0, 0, 255]));
        image.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let blurred = run_filter(&GaussianBlur::new(2, 1.0), &image);

        let center = blurred.get_pixel(4, 4);
        assert!(center.0[0] < 255 && center.0[0] > 0);
        assert_eq!(blurred.get_pixel(3, 4), blurred.get_pixel(5, 4));
        assert_eq!(blurred.get_pixel(4, 3), blurred.get_pixel(4, 5));
        assert!(blurred.get_pixel(3, 4).0[0] < center.0[0]);
        assert_eq!(blurred.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_gaussian_band_count_independent() {
        let image = PixelBuffer::<u8>::from_fn(8, 11, |x, y| Rgba([(x * 29) as u8, (y * 23) as u8, 90, 255]));
        let blur = GaussianBlur::new(3, 2.0);
        let whole = run_filter(&blur, &image);
        assert_eq!(run_filter_banded(&blur, &image, 4), whole);
    }

    #[test]
    fn test_gaussian_args() {
        let args = |values: &[&str]| values.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let blur = GaussianBlur::from_args(&[]).unwrap();
        assert_eq!(blur.kernel().radius(), DEFAULT_GAUSSIAN_RADIUS);
        assert_eq!(blur.border(), BorderMode::Mirror);

        let blur = GaussianBlur::from_args(&args(&["2", "0.8", "none"])).unwrap();
        assert_eq!(blur.kernel().size(), 5);
        assert_eq!(blur.kernel().sigma(), 0.8);
        assert_eq!(blur.border(), BorderMode::None);

        assert!(GaussianBlur::from_args(&args(&["-1"])).is_err());
        assert!(GaussianBlur::from_args(&args(&["2", "0"])).is_err());
        assert!(GaussianBlur::from_args(&args(&["2", "1", "wrap"])).is_err());
        assert!(GaussianBlur::from_args(&args(&["1000"])).is_err());
    }
}
