//! Convolution kernels and windowed sampling.
//!
//! [`Kernel::gaussian`] builds a normalized square kernel, [`sample_window`]
//! gathers the pixels under it around a coordinate, and [`Kernel::apply`]
//! folds the two into one output pixel.

use crate::core::types::{Channel, PixelBuffer, Rgba, CHANNELS};

/// What to do with window taps that fall outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderMode {
    /// Taps outside the image are absent; the kernel renormalizes over the rest.
    None,
    /// Taps are reflected back across the nearest edge (`-1 -> 1`, `B -> B - 2`).
    #[default]
    Mirror,
}

impl BorderMode {
    /// Parse a border mode name (`"mirror"` or `"none"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mirror" => Some(BorderMode::Mirror),
            "none" => Some(BorderMode::None),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            BorderMode::None => "none",
            BorderMode::Mirror => "mirror",
        }
    }
}

/// Map a possibly out-of-range coordinate into `[0, len)`.
///
/// Mirror reflection excludes the edge pixel itself, so it repeats with
/// period `2 * len - 2` and handles windows larger than the image.
pub fn map_index(i: i64, len: u32, mode: BorderMode) -> Option<u32> {
    if len == 0 {
        return None;
    }
    if i >= 0 && i < len as i64 {
        return Some(i as u32);
    }

    match mode {
        BorderMode::None => None,
        BorderMode::Mirror => {
            if len == 1 {
                return Some(0);
            }
            let period = 2 * len as i64 - 2;
            let r = i.rem_euclid(period);
            if r < len as i64 {
                Some(r as u32)
            } else {
                Some((period - r) as u32)
            }
        }
    }
}

/// A square, normalized convolution kernel of odd side `2 * radius + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    radius: u32,
    sigma: f64,
    weights: Vec<f64>,
}

impl Kernel {
    /// Build a Gaussian kernel.
    ///
    /// Raw weights `exp(-(dx² + dy²) / 2σ²)` are divided by their sum, so the
    /// result sums to one within floating-point tolerance. A radius of zero
    /// gives the single weight `1.0`.
    pub fn gaussian(radius: u32, sigma: f64) -> Self {
        let size = 2 * radius as usize + 1;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let r = radius as f64;

        let mut weights = Vec::with_capacity(size * size);
        for ky in 0..size {
            for kx in 0..size {
                let dy = ky as f64 - r;
                let dx = kx as f64 - r;
                weights.push((-(dx * dx + dy * dy) / two_sigma_sq).exp());
            }
        }

        let sum: f64 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= sum;
        }

        Self {
            radius,
            sigma,
            weights,
        }
    }

    /// Kernel radius.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Side length, `2 * radius + 1`.
    pub fn size(&self) -> u32 {
        2 * self.radius + 1
    }

    /// Spread parameter the kernel was built with.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Weight at `(kx, ky)` within the kernel.
    pub fn weight(&self, kx: u32, ky: u32) -> f64 {
        self.weights[(ky * self.size() + kx) as usize]
    }

    /// All weights, row-major.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Convolve one window of pixels, all four channels.
    ///
    /// Absent taps are skipped and the remaining weights renormalized. The
    /// result is rounded and clamped to the channel range.
    pub fn apply<C: Channel>(&self, window: &Window<C>) -> Rgba<C> {
        debug_assert_eq!(window.size(), self.size());

        let mut acc = [0.0f64; CHANNELS];
        let mut total = 0.0f64;

        for (tap, &weight) in window.taps().iter().zip(&self.weights) {
            if let Some(pixel) = tap {
                for (sum, &value) in acc.iter_mut().zip(&pixel.0) {
                    *sum += value.to_f64() * weight;
                }
                total += weight;
            }
        }

        if total <= 0.0 {
            return Rgba([C::default(); CHANNELS]);
        }

        Rgba(acc.map(|sum| C::from_f64_saturating((sum / total).round())))
    }
}

/// A square grid of sampled pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<C: Channel> {
    size: u32,
    taps: Vec<Option<Rgba<C>>>,
}

impl<C: Channel> Window<C> {
    /// An empty window of side `size`.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            taps: vec![None; (size * size) as usize],
        }
    }

    /// Side length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Tap at `(kx, ky)` within the window.
    pub fn get(&self, kx: u32, ky: u32) -> Option<Rgba<C>> {
        self.taps[(ky * self.size + kx) as usize]
    }

    /// All taps, row-major.
    pub fn taps(&self) -> &[Option<Rgba<C>>] {
        &self.taps
    }

    /// Refill this window centered on `(cx, cy)`.
    pub fn fill(&mut self, buffer: &PixelBuffer<C>, cx: u32, cy: u32, border: BorderMode) {
        let half = (self.size / 2) as i64;
        let (width, height) = buffer.dimensions();

        for ky in 0..self.size {
            let sy = map_index(cy as i64 - half + ky as i64, height, border);
            for kx in 0..self.size {
                let sx = map_index(cx as i64 - half + kx as i64, width, border);
                self.taps[(ky * self.size + kx) as usize] = match (sx, sy) {
                    (Some(sx), Some(sy)) => Some(buffer.get_pixel(sx, sy)),
                    _ => None,
                };
            }
        }
    }
}

/// Sample a `size x size` window centered on `(cx, cy)`.
pub fn sample_window<C: Channel>(
    buffer: &PixelBuffer<C>,
    cx: u32,
    cy: u32,
    size: u32,
    border: BorderMode,
) -> Window<C> {
    let mut window = Window::new(size);
    window.fill(buffer, cx, cy, border);
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered(width: u32, height: u32) -> PixelBuffer<u8> {
        PixelBuffer::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 7, 255]))
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        for radius in [1, 2, 5, 10] {
            for sigma in [0.5, 1.0, 3.0] {
                let kernel = Kernel::gaussian(radius, sigma);
                let sum: f64 = kernel.weights().iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "r={} sigma={} sum={}", radius, sigma, sum);
                assert_eq!(kernel.weights().len(), (kernel.size() * kernel.size()) as usize);
                assert!(kernel.weights().iter().all(|&w| w >= 0.0));
            }
        }
    }

    #[test]
    fn test_gaussian_kernel_symmetric_and_peaked() {
        let kernel = Kernel::gaussian(2, 1.0);
        assert_eq!(kernel.size(), 5);
        assert!((kernel.weight(0, 0) - kernel.weight(4, 4)).abs() < 1e-15);
        assert!((kernel.weight(1, 2) - kernel.weight(2, 1)).abs() < 1e-15);
        assert!(kernel.weight(2, 2) > kernel.weight(1, 2));
    }

    #[test]
    fn test_zero_radius_kernel() {
        let kernel = Kernel::gaussian(0, 1.0);
        assert_eq!(kernel.size(), 1);
        assert_eq!(kernel.weights(), &[1.0]);
    }

    #[test]
    fn test_mirror_index() {
        let cases = [(-3, 3), (-2, 2), (-1, 1), (0, 0), (4, 4), (5, 3), (6, 2), (7, 1), (8, 0), (9, 1)];
        for (i, expected) in cases {
            assert_eq!(map_index(i, 5, BorderMode::Mirror), Some(expected), "index {}", i);
        }
        assert_eq!(map_index(-4, 1, BorderMode::Mirror), Some(0));
        assert_eq!(map_index(-1, 2, BorderMode::Mirror), Some(1));
        assert_eq!(map_index(2, 2, BorderMode::Mirror), Some(0));
    }

    #[test]
    fn test_none_index() {
        assert_eq!(map_index(-1, 5, BorderMode::None), None);
        assert_eq!(map_index(5, 5, BorderMode::None), None);
        assert_eq!(map_index(4, 5, BorderMode::None), Some(4));
    }

    #[test]
    fn test_corner_window_mirrors() {
        let image = numbered(4, 4);
        let window = sample_window(&image, 0, 0, 3, BorderMode::Mirror);

        assert_eq!(window.get(0, 0), Some(image.get_pixel(1, 1)));
        assert_eq!(window.get(1, 0), Some(image.get_pixel(0, 1)));
        assert_eq!(window.get(1, 1), Some(image.get_pixel(0, 0)));
        assert!(window.taps().iter().all(|t| t.is_some()));

        let window = sample_window(&image, 3, 3, 3, BorderMode::None);
        assert_eq!(window.get(2, 2), None);
        assert_eq!(window.get(1, 1), Some(image.get_pixel(3, 3)));
    }

    #[test]
    fn test_window_larger_than_image() {
        let image = numbered(2, 3);
        let window = sample_window(&image, 1, 1, 11, BorderMode::Mirror);
        assert!(window.taps().iter().all(|t| t.is_some()));
    }

    #[test]
    fn test_apply_identity_and_uniform() {
        let image = numbered(5, 5);
        let identity = Kernel::gaussian(0, 2.0);
        let window = sample_window(&image, 3, 2, 1, BorderMode::Mirror);
        assert_eq!(identity.apply(&window), image.get_pixel(3, 2));

        let flat = PixelBuffer::filled(6, 6, Rgba([200u16, 100, 50, 65535]));
        let kernel = Kernel::gaussian(2, 1.5);
        for (x, y) in [(0, 0), (3, 3), (5, 1)] {
            for border in [BorderMode::Mirror, BorderMode::None] {
                let window = sample_window(&flat, x, y, kernel.size(), border);
                assert_eq!(kernel.apply(&window), Rgba([200, 100, 50, 65535]));
            }
        }
    }

    #[test]
    fn test_border_mode_names() {
        assert_eq!(BorderMode::from_name("Mirror"), Some(BorderMode::Mirror));
        assert_eq!(BorderMode::from_name("none"), Some(BorderMode::None));
        assert_eq!(BorderMode::from_name("wrap"), None);
        assert_eq!(BorderMode::default().name(), "mirror");
    }

    proptest! {
        #[test]
        fn prop_mirror_stays_in_bounds(i in -500i64..500, len in 1u32..40) {
            let mapped = map_index(i, len, BorderMode::Mirror);
            prop_assert!(matches!(mapped, Some(m) if m < len));
        }

        #[test]
        fn prop_interior_window_is_unmirrored(
            radius in 0u32..6,
            extra_w in 0u32..30,
            extra_h in 0u32..30,
            seed_x in 0u32..1000,
            seed_y in 0u32..1000
        ) {
            let size = 2 * radius + 1;
            let image = numbered(size + extra_w, size + extra_h);
            // Every center at least `radius` away from each edge.
            let cx = radius + seed_x % (extra_w + 1);
            let cy = radius + seed_y % (extra_h + 1);

            let window = sample_window(&image, cx, cy, size, BorderMode::Mirror);
            for ky in 0..size {
                for kx in 0..size {
                    prop_assert_eq!(
                        window.get(kx, ky),
                        Some(image.get_pixel(cx - radius + kx, cy - radius + ky))
                    );
                }
            }
        }
    }
}
