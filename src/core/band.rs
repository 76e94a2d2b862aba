//! Row-band partitioning of an image.
//!
//! An image of height `H` is split into contiguous half-open row ranges
//! `[start, end)`. Each band is handed to exactly one worker per iteration,
//! so the bands must cover every row exactly once.

/// Multiplier applied to the worker count to get the default band count.
pub const BANDS_PER_WORKER: usize = 2;

/// A contiguous half-open range of rows `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowBand {
    /// First row of the band.
    pub start: u32,
    /// One past the last row of the band.
    pub end: u32,
}

impl RowBand {
    /// Create a new band.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of rows in this band.
    pub fn rows(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the band contains no rows.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether row `y` belongs to this band.
    pub fn contains(&self, y: u32) -> bool {
        y >= self.start && y < self.end
    }
}

/// Default number of bands: twice the number of rayon workers.
pub fn default_band_count() -> usize {
    rayon::current_num_threads().max(1) * BANDS_PER_WORKER
}

/// Iterator over the row bands of an image.
///
/// Uses `rows_per_band = ceil(height / band_count)`, so the last band may be
/// shorter and fewer than `band_count` bands can be produced for short images.
#[derive(Debug, Clone)]
pub struct RowBands {
    height: u32,
    rows_per_band: u32,
    next_start: u32,
}

impl RowBands {
    /// Create a band iterator. A `band_count` of zero is treated as one.
    pub fn new(height: u32, band_count: usize) -> Self {
        let band_count = band_count.clamp(1, u32::MAX as usize) as u32;
        let rows_per_band = height.div_ceil(band_count).max(1);

        Self {
            height,
            rows_per_band,
            next_start: 0,
        }
    }

    /// Rows assigned to every band but (possibly) the last.
    pub fn rows_per_band(&self) -> u32 {
        self.rows_per_band
    }

    /// Total number of bands this iterator yields.
    pub fn band_count(&self) -> usize {
        self.height.div_ceil(self.rows_per_band) as usize
    }
}

impl Iterator for RowBands {
    type Item = RowBand;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_start >= self.height {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.rows_per_band).min(self.height);
        self.next_start = end;

        Some(RowBand::new(start, end))
    }
}
