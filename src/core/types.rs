//! Pixel model for Rasterband.
//!
//! Images are stored as tightly packed RGBA rows in one of two channel
//! depths. Filters are written once, generic over [`Channel`], and the
//! per-depth constants (maximum value, 8-bit scale) come from the trait.

use crate::core::band::RowBand;
use crate::core::error::{RasterError, RasterResult};
use std::fmt;

pub use image::Rgba;

/// Number of channels per pixel.
pub const CHANNELS: usize = 4;

/// Rec. 709 luma weight for the red channel.
pub const LUMA_RED: f64 = 0.2126;
/// Rec. 709 luma weight for the green channel.
pub const LUMA_GREEN: f64 = 0.7152;
/// Rec. 709 luma weight for the blue channel.
pub const LUMA_BLUE: f64 = 0.0722;

/// Bits per color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelDepth {
    /// 8 bits per channel.
    Eight,
    /// 16 bits per channel.
    Sixteen,
}

impl ChannelDepth {
    /// Number of bits per channel.
    pub fn bits(self) -> u32 {
        match self {
            ChannelDepth::Eight => 8,
            ChannelDepth::Sixteen => 16,
        }
    }

    /// Largest representable channel value.
    pub fn max_value(self) -> u32 {
        (1 << self.bits()) - 1
    }
}

impl fmt::Display for ChannelDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// A color channel primitive (`u8` or `u16`).
pub trait Channel:
    Copy + Default + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Depth this primitive represents.
    const DEPTH: ChannelDepth;
    /// Largest channel value.
    const MAX: Self;

    /// Widen to `u32`.
    fn to_u32(self) -> u32;

    /// Narrow from `u32`, saturating at [`Channel::MAX`].
    fn from_u32_saturating(value: u32) -> Self;

    /// Narrow from `f64`, saturating to `[0, MAX]`. NaN maps to zero.
    fn from_f64_saturating(value: f64) -> Self;

    /// Widen to `f64`.
    fn to_f64(self) -> f64 {
        self.to_u32() as f64
    }

    /// [`Channel::MAX`] as `u32`.
    fn max_u32() -> u32 {
        Self::MAX.to_u32()
    }

    /// Factor that lifts an 8-bit level into this depth (1 for 8-bit, 257 for 16-bit).
    fn scale_from_8bit() -> u32 {
        Self::max_u32() / 255
    }
}

impl Channel for u8 {
    const DEPTH: ChannelDepth = ChannelDepth::Eight;
    const MAX: Self = u8::MAX;

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_u32_saturating(value: u32) -> Self {
        value.min(u8::MAX as u32) as u8
    }

    fn from_f64_saturating(value: f64) -> Self {
        if value.is_nan() {
            0
        } else {
            value.clamp(0.0, u8::MAX as f64) as u8
        }
    }
}

impl Channel for u16 {
    const DEPTH: ChannelDepth = ChannelDepth::Sixteen;
    const MAX: Self = u16::MAX;

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_u32_saturating(value: u32) -> Self {
        value.min(u16::MAX as u32) as u16
    }

    fn from_f64_saturating(value: f64) -> Self {
        if value.is_nan() {
            0
        } else {
            value.clamp(0.0, u16::MAX as f64) as u16
        }
    }
}

/// Luma of a pixel in the native range of its depth.
pub fn luma<C: Channel>(pixel: Rgba<C>) -> f64 {
    let [r, g, b, _] = pixel.0;
    r.to_f64() * LUMA_RED + g.to_f64() * LUMA_GREEN + b.to_f64() * LUMA_BLUE
}

/// An in-memory RGBA raster with a fixed size.
///
/// Rows are stored top to bottom, each row holding `width * 4` channels.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer<C: Channel> {
    width: u32,
    height: u32,
    data: Vec<C>,
}

impl<C: Channel> PixelBuffer<C> {
    /// Create a zeroed buffer.
    ///
    /// # Panics
    /// Panics if either dimension is zero. Use [`PixelBuffer::try_new`] for a
    /// fallible variant.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "image dimensions must be non-zero");
        Self {
            width,
            height,
            data: vec![C::default(); width as usize * height as usize * CHANNELS],
        }
    }

    /// Create a zeroed buffer, rejecting empty dimensions.
    pub fn try_new(width: u32, height: u32) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyImage { width, height });
        }
        Ok(Self::new(width, height))
    }

    /// Wrap raw RGBA channel data. Returns `None` if the length does not
    /// match the dimensions or a dimension is zero.
    pub fn from_raw(width: u32, height: u32, data: Vec<C>) -> Option<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if width == 0 || height == 0 || data.len() != expected {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Create a buffer by evaluating `f` at every coordinate.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> Rgba<C>,
    {
        let mut buffer = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                buffer.put_pixel(x, y, f(x, y));
            }
        }
        buffer
    }

    /// Create a buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: Rgba<C>) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channel depth of this buffer.
    pub fn depth(&self) -> ChannelDepth {
        C::DEPTH
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<C> {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of bounds for {}x{} image",
            x,
            y,
            self.width,
            self.height
        );
        let i = self.offset(x, y);
        Rgba([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Read the pixel at a signed coordinate, `None` outside the image.
    pub fn pixel_at(&self, x: i64, y: i64) -> Option<Rgba<C>> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.get_pixel(x as u32, y as u32))
    }

    /// Write the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<C>) {
        assert!(x < self.width && y < self.height);
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&color.0);
    }

    /// Decode row `y` into `out`, replacing its contents.
    pub fn read_row_into(&self, y: u32, out: &mut Vec<Rgba<C>>) {
        let start = self.offset(0, y);
        let end = start + self.width as usize * CHANNELS;
        out.clear();
        out.extend(
            self.data[start..end]
                .chunks_exact(CHANNELS)
                .map(|c| Rgba([c[0], c[1], c[2], c[3]])),
        );
    }

    /// Raw channel data.
    pub fn as_raw(&self) -> &[C] {
        &self.data
    }

    /// Consume the buffer, returning the raw channel data.
    pub fn into_raw(self) -> Vec<C> {
        self.data
    }

    /// Split the buffer into one exclusive writer per band.
    ///
    /// Bands must be in ascending order, non-overlapping and within the image.
    /// Rows not covered by any band are left untouched.
    ///
    /// # Panics
    /// Panics if the bands are unordered, overlap or exceed the image height.
    pub fn split_bands_mut(&mut self, bands: &[RowBand]) -> Vec<BandWriter<'_, C>> {
        let stride = self.width as usize * CHANNELS;
        let width = self.width;
        let height = self.height;
        let mut rest: &mut [C] = &mut self.data;
        let mut cursor = 0u32;
        let mut writers = Vec::with_capacity(bands.len());

        for band in bands {
            assert!(
                band.start >= cursor && band.end <= height && band.start <= band.end,
                "band {:?} is unordered or out of bounds",
                band
            );
            let skip = (band.start - cursor) as usize * stride;
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
            let (rows, tail) = tail.split_at_mut(band.rows() as usize * stride);

            writers.push(BandWriter {
                band: *band,
                width,
                data: rows,
            });

            rest = tail;
            cursor = band.end;
        }

        writers
    }
}

impl<C: Channel> fmt::Debug for PixelBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &C::DEPTH)
            .finish()
    }
}

/// Exclusive write access to the rows of one band of a [`PixelBuffer`].
///
/// Coordinates are absolute image coordinates.
pub struct BandWriter<'a, C: Channel> {
    band: RowBand,
    width: u32,
    data: &'a mut [C],
}

impl<'a, C: Channel> BandWriter<'a, C> {
    /// The band this writer covers.
    pub fn band(&self) -> RowBand {
        self.band
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && self.band.contains(y),
            "pixel ({}, {}) outside band {:?}",
            x,
            y,
            self.band
        );
        ((y - self.band.start) as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Write the pixel at absolute coordinate `(x, y)`.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<C>) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&color.0);
    }

    /// Read back the pixel at absolute coordinate `(x, y)`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<C> {
        let i = self.offset(x, y);
        Rgba([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// A pixel buffer of either supported depth.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicBuffer {
    /// 8 bits per channel.
    Rgba8(PixelBuffer<u8>),
    /// 16 bits per channel.
    Rgba16(PixelBuffer<u16>),
}

impl DynamicBuffer {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            DynamicBuffer::Rgba8(b) => b.width(),
            DynamicBuffer::Rgba16(b) => b.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            DynamicBuffer::Rgba8(b) => b.height(),
            DynamicBuffer::Rgba16(b) => b.height(),
        }
    }

    /// Channel depth.
    pub fn depth(&self) -> ChannelDepth {
        match self {
            DynamicBuffer::Rgba8(_) => ChannelDepth::Eight,
            DynamicBuffer::Rgba16(_) => ChannelDepth::Sixteen,
        }
    }
}

impl From<PixelBuffer<u8>> for DynamicBuffer {
    fn from(buffer: PixelBuffer<u8>) -> Self {
        DynamicBuffer::Rgba8(buffer)
    }
}

impl From<PixelBuffer<u16>> for DynamicBuffer {
    fn from(buffer: PixelBuffer<u16>) -> Self {
        DynamicBuffer::Rgba16(buffer)
    }
}
