//! Spot light: darkens towards the edge of a circle, whites out beyond it

use crate::core::error::ConfigError;
use crate::core::filter::{
    invalid_argument, parse_argument, ArgumentKind, Category, FilterDescriptor, FilterMetadata,
    ParameterDefinition, PixelFilter,
};
use crate::core::iterator::{NeighborIterator, NeighborMode};
use crate::core::types::{BandWriter, Channel, PixelBuffer, Rgba};
use crate::execution::progress::ProgressTracker;
use crate::filters::registry::FilterRegistry;

/// Register lighting filters.
pub fn register<C: Channel>(registry: &mut FilterRegistry<C>) {
    registry.register::<Spot>();
}

/// Circular spot light centered on `(x, y)`.
///
/// Inside the radius, RGB is scaled by `1 - d / radius`; outside it, RGB is
/// set to the channel maximum. Alpha is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spot {
    x: i64,
    y: i64,
    radius: f64,
}

impl Spot {
    /// Create a spot light. `radius` must be positive.
    pub fn new(x: i64, y: i64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    /// Spot center.
    pub fn center(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Spot radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Light one pixel at `(px, py)`.
    pub fn light<C: Channel>(&self, px: u32, py: u32, pixel: Rgba<C>) -> Rgba<C> {
        let dx = (px as i64 - self.x) as f64;
        let dy = (py as i64 - self.y) as f64;
        let distance = (dx * dx + dy * dy).sqrt();
        let [r, g, b, a] = pixel.0;

        if distance > self.radius {
            return Rgba([C::MAX, C::MAX, C::MAX, a]);
        }

        let factor = 1.0 - distance / self.radius;
        let scale = |v: C| C::from_f64_saturating(v.to_f64() * factor);
        Rgba([scale(r), scale(g), scale(b), a])
    }
}

impl FilterDescriptor for Spot {
    fn metadata() -> FilterMetadata {
        FilterMetadata::builder("spot", "Spot Light")
            .description("Fade the image towards the rim of a circle and white out everything beyond it")
            .category(Category::Light)
            .parameter(ParameterDefinition::required("x", ArgumentKind::Integer).with_description("Center column"))
            .parameter(ParameterDefinition::required("y", ArgumentKind::Integer).with_description("Center row"))
            .parameter(
                ParameterDefinition::required("radius", ArgumentKind::Float)
                    .with_description("Radius in pixels (positive)"),
            )
            .build()
    }

    fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let missing = || ConfigError::MissingArgument {
            filter: "spot".to_string(),
            expected: Self::metadata().required_argument_names(),
        };

        let x = parse_argument::<i64>("spot", args, 0, "x")?.ok_or_else(missing)?;
        let y = parse_argument::<i64>("spot", args, 1, "y")?.ok_or_else(missing)?;
        let radius = parse_argument::<f64>("spot", args, 2, "radius")?.ok_or_else(missing)?;

        if !radius.is_finite() || radius <= 0.0 {
            return Err(invalid_argument("spot", "radius", radius, "must be a positive number"));
        }

        Ok(Self::new(x, y, radius))
    }
}

impl<C: Channel> PixelFilter<C> for Spot {
    fn id(&self) -> &'static str {
        "spot"
    }

    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker) {
        for ctx in NeighborIterator::new(source, target.band(), NeighborMode::None).with_progress(progress) {
            target.put_pixel(ctx.x, ctx.y, self.light(ctx.x, ctx.y, ctx.pixel));
        }
    }
}
