//! Neighbor-aware pixel iteration over a row band.
//!
//! [`NeighborIterator`] walks a band of a [`PixelBuffer`] in row-major order
//! and yields a [`PixelContext`] per pixel. In [`NeighborMode::Direct`] each
//! context also carries the four cardinal neighbors, absent at the image edge.
//!
//! Rows are decoded once into three rolling row caches (above, current,
//! below), so sliding along a row never re-reads the source buffer. Completed
//! rows are reported to a [`ProgressTracker`] in batches.

use crate::core::band::RowBand;
use crate::core::types::{Channel, PixelBuffer, Rgba};
use crate::execution::progress::ProgressTracker;

/// Number of progress reports a band emits (at most, plus a remainder).
pub const PROGRESS_REPORTS_PER_BAND: u32 = 2;

/// Which neighbors a [`PixelContext`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborMode {
    /// Only the current pixel.
    None,
    /// The current pixel and its north, south, east and west neighbors.
    Direct,
}

/// One step of a [`NeighborIterator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelContext<C: Channel> {
    /// Column of the current pixel.
    pub x: u32,
    /// Row of the current pixel.
    pub y: u32,
    /// Color of the current pixel.
    pub pixel: Rgba<C>,
    /// Pixel at `(x, y - 1)`, if any.
    pub north: Option<Rgba<C>>,
    /// Pixel at `(x, y + 1)`, if any.
    pub south: Option<Rgba<C>>,
    /// Pixel at `(x + 1, y)`, if any.
    pub east: Option<Rgba<C>>,
    /// Pixel at `(x - 1, y)`, if any.
    pub west: Option<Rgba<C>>,
}

impl<C: Channel> PixelContext<C> {
    /// The present cardinal neighbors, in N, W, E, S order.
    pub fn neighbors(&self) -> impl Iterator<Item = Rgba<C>> {
        [self.north, self.west, self.east, self.south]
            .into_iter()
            .flatten()
    }
}

/// Row-major iterator over the pixels of one band.
pub struct NeighborIterator<'a, C: Channel> {
    source: &'a PixelBuffer<C>,
    band: RowBand,
    mode: NeighborMode,
    cur_x: u32,
    cur_y: u32,
    row_above: Vec<Rgba<C>>,
    row_current: Vec<Rgba<C>>,
    row_below: Vec<Rgba<C>>,
    progress: Option<&'a ProgressTracker>,
    progress_step: u32,
}

impl<'a, C: Channel> NeighborIterator<'a, C> {
    /// Create an iterator over `band` of `source`.
    ///
    /// The band is clamped to the image height.
    pub fn new(source: &'a PixelBuffer<C>, band: RowBand, mode: NeighborMode) -> Self {
        let band = RowBand::new(
            band.start.min(source.height()),
            band.end.min(source.height()),
        );
        let progress_step = (band.rows() / PROGRESS_REPORTS_PER_BAND).max(1);
        let width = source.width() as usize;

        Self {
            source,
            band,
            mode,
            cur_x: 0,
            cur_y: band.start,
            row_above: Vec::with_capacity(width),
            row_current: Vec::with_capacity(width),
            row_below: Vec::with_capacity(width),
            progress: None,
            progress_step,
        }
    }

    /// Report completed rows to `tracker`.
    pub fn with_progress(mut self, tracker: &'a ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    /// The band being iterated.
    pub fn band(&self) -> RowBand {
        self.band
    }

    /// Whether another pixel remains in the band.
    pub fn has_next(&self) -> bool {
        self.cur_y < self.band.end
    }

    /// Refresh the row caches when entering row `y`.
    fn enter_row(&mut self, y: u32) {
        let height = self.source.height();

        if y == self.band.start {
            if y > 0 {
                self.source.read_row_into(y - 1, &mut self.row_above);
            } else {
                self.row_above.clear();
            }
            self.source.read_row_into(y, &mut self.row_current);
        } else {
            // Current becomes above, the pre-read row below becomes current.
            std::mem::swap(&mut self.row_above, &mut self.row_current);
            std::mem::swap(&mut self.row_current, &mut self.row_below);
        }

        if y + 1 < height {
            self.source.read_row_into(y + 1, &mut self.row_below);
        } else {
            self.row_below.clear();
        }
    }

    fn report_row_completed(&self) {
        let Some(tracker) = self.progress else {
            return;
        };

        let done = self.cur_y - self.band.start;
        if done % self.progress_step == 0 {
            tracker.rows_completed(self.progress_step as u64);
        } else if self.cur_y == self.band.end {
            tracker.rows_completed((done % self.progress_step) as u64);
        }
    }
}

impl<'a, C: Channel> Iterator for NeighborIterator<'a, C> {
    type Item = PixelContext<C>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        let (x, y) = (self.cur_x, self.cur_y);
        let width = self.source.width();

        let context = match self.mode {
            NeighborMode::None => PixelContext {
                x,
                y,
                pixel: self.source.get_pixel(x, y),
                north: None,
                south: None,
                east: None,
                west: None,
            },
            NeighborMode::Direct => {
                if x == 0 {
                    self.enter_row(y);
                }
                let xi = x as usize;

                PixelContext {
                    x,
                    y,
                    pixel: self.row_current[xi],
                    north: self.row_above.get(xi).copied(),
                    south: self.row_below.get(xi).copied(),
                    east: if x + 1 < width {
                        Some(self.row_current[xi + 1])
                    } else {
                        None
                    },
                    west: if x > 0 {
                        Some(self.row_current[xi - 1])
                    } else {
                        None
                    },
                }
            }
        };

        self.cur_x += 1;
        if self.cur_x >= width {
            self.cur_x = 0;
            self.cur_y += 1;
            self.report_row_completed();
        }

        Some(context)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let width = self.source.width() as usize;
        let remaining = if self.has_next() {
            (self.band.end - self.cur_y) as usize * width - self.cur_x as usize
        } else {
            0
        };
        (remaining, Some(remaining))
    }
}

impl<'a, C: Channel> ExactSizeIterator for NeighborIterator<'a, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn numbered(width: u32, height: u32) -> PixelBuffer<u8> {
        PixelBuffer::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_row_major_order_covers_band() {
        let image = numbered(4, 6);
        let iter = NeighborIterator::new(&image, RowBand::new(2, 5), NeighborMode::Direct);
        assert_eq!(iter.len(), 12);

        let coords: Vec<_> = iter.map(|c| (c.x, c.y)).collect();
        let expected: Vec<_> = (2..5).flat_map(|y| (0..4).map(move |x| (x, y))).collect();
        assert_eq!(coords, expected);
    }

    #[test]
    fn test_has_next_stops_at_band_end() {
        let image = numbered(2, 4);
        let mut iter = NeighborIterator::new(&image, RowBand::new(1, 2), NeighborMode::None);
        assert!(iter.has_next());
        assert_eq!(iter.next().map(|c| (c.x, c.y)), Some((0, 1)));
        assert_eq!(iter.next().map(|c| (c.x, c.y)), Some((1, 1)));
        assert!(!iter.has_next());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_none_mode_has_no_neighbors() {
        let image = numbered(3, 3);
        for context in NeighborIterator::new(&image, RowBand::new(0, 3), NeighborMode::None) {
            assert_eq!(context.pixel, image.get_pixel(context.x, context.y));
            assert_eq!(context.neighbors().count(), 0);
        }
    }

    #[test]
    fn test_direct_neighbors_absent_only_at_edges() {
        let (width, height) = (5, 4);
        let image = numbered(width, height);

        for band in [RowBand::new(0, 4), RowBand::new(0, 1), RowBand::new(1, 3), RowBand::new(3, 4)] {
            for c in NeighborIterator::new(&image, band, NeighborMode::Direct) {
                let (x, y) = (c.x as i64, c.y as i64);
                assert_eq!(c.pixel, image.get_pixel(c.x, c.y));
                assert_eq!(c.north, image.pixel_at(x, y - 1), "north at {:?}", (x, y));
                assert_eq!(c.south, image.pixel_at(x, y + 1), "south at {:?}", (x, y));
                assert_eq!(c.west, image.pixel_at(x - 1, y), "west at {:?}", (x, y));
                assert_eq!(c.east, image.pixel_at(x + 1, y), "east at {:?}", (x, y));

                assert_eq!(c.north.is_none(), c.y == 0);
                assert_eq!(c.south.is_none(), c.y == height - 1);
                assert_eq!(c.west.is_none(), c.x == 0);
                assert_eq!(c.east.is_none(), c.x == width - 1);
            }
        }
    }

    #[test]
    fn test_single_column_and_row_images() {
        let column = numbered(1, 3);
        let contexts: Vec<_> =
            NeighborIterator::new(&column, RowBand::new(0, 3), NeighborMode::Direct).collect();
        assert!(contexts.iter().all(|c| c.east.is_none() && c.west.is_none()));
        assert_eq!(contexts[1].neighbors().count(), 2);

        let single = numbered(1, 1);
        let contexts: Vec<_> =
            NeighborIterator::new(&single, RowBand::new(0, 1), NeighborMode::Direct).collect();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].neighbors().count(), 0);
    }

    fn progress_total(height: u32, band: RowBand) -> (u64, Vec<u64>) {
        let image = numbered(3, height);
        let total = Arc::new(AtomicU64::new(0));
        let tracker = ProgressTracker::new(height as u64);

        let reports = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let reports_clone = reports.clone();
        let total_clone = total.clone();
        let tracker = tracker.with_callback(Box::new(move |update| {
            if let crate::execution::progress::ProgressUpdate::Progress { completed_rows, .. } = update {
                total_clone.store(completed_rows, Ordering::Relaxed);
                reports_clone.lock().push(completed_rows);
            }
        }));

        let iter = NeighborIterator::new(&image, band, NeighborMode::Direct).with_progress(&tracker);
        assert_eq!(iter.count(), band.rows() as usize * 3);

        let reports = reports.lock().clone();
        (total.load(Ordering::Relaxed), reports)
    }

    #[test]
    fn test_progress_sums_to_band_rows() {
        for rows in 1..12u32 {
            let (total, reports) = progress_total(12, RowBand::new(0, rows));
            assert_eq!(total, rows as u64, "band of {} rows", rows);
            assert!(reports.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_progress_batches_reports() {
        let (total, reports) = progress_total(10, RowBand::new(0, 10));
        assert_eq!(total, 10);
        assert_eq!(reports, vec![5, 10]);

        let (total, reports) = progress_total(7, RowBand::new(0, 7));
        assert_eq!(total, 7);
        assert_eq!(reports, vec![3, 6, 7]);
    }
}
