//! Parallel filter engine.
//!
//! The engine owns two buffers, the current source and the current
//! destination. Each iteration splits the destination into disjoint row
//! bands, applies the filter to every band as its own rayon task, and waits
//! for all of them before the next iteration. The buffers then trade roles, so
//! iteration `i + 1` reads exactly what iteration `i` wrote.

use crate::core::band::{default_band_count, RowBand, RowBands, BANDS_PER_WORKER};
use crate::core::error::{ConfigError, RasterResult};
use crate::core::filter::PixelFilter;
use crate::core::types::{BandWriter, Channel, PixelBuffer};
use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
use crate::filters::registry::FilterRegistry;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Engine options.
#[derive(Clone, Default)]
pub struct EngineOptions {
    /// Number of row bands per iteration (0 = twice the worker count).
    pub band_count: usize,
    /// Maximum number of worker threads (0 = rayon's global pool).
    pub max_threads: usize,
    /// Progress callback.
    pub progress_callback: Option<Arc<ProgressCallback>>,
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("band_count", &self.band_count)
            .field("max_threads", &self.max_threads)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl EngineOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of row bands.
    pub fn with_band_count(mut self, bands: usize) -> Self {
        self.band_count = bands;
        self
    }

    /// Set maximum threads.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }
}

/// Lifecycle of a [`FilterEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No filter selected yet.
    Idle,
    /// A filter is selected and the engine is ready to run.
    FilterSet,
    /// Iteration `iteration` (zero-based) of `iterations` is in progress.
    Running { iteration: usize, iterations: usize },
    /// The last run finished.
    Done,
}

/// Statistics of one call to [`FilterEngine::run`].
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Iterations performed.
    pub iterations: usize,
    /// Bands dispatched per iteration.
    pub bands: usize,
    /// Rows per band (the last band may be shorter).
    pub rows_per_band: u32,
    /// Wall-clock time of each iteration.
    pub iteration_durations: Vec<Duration>,
    /// Wall-clock time of the whole run.
    pub total_duration: Duration,
}

/// Multi-iteration, band-parallel filter engine for channel type `C`.
pub struct FilterEngine<C: Channel> {
    /// Buffer read by the next iteration.
    source: PixelBuffer<C>,
    /// Buffer written by the next iteration.
    destination: PixelBuffer<C>,
    /// The destination holds the latest output and must trade roles before
    /// the next iteration.
    pending_swap: bool,
    registry: FilterRegistry<C>,
    filter: Option<Box<dyn PixelFilter<C>>>,
    filter_name: Option<String>,
    options: EngineOptions,
    pool: Option<rayon::ThreadPool>,
    state: EngineState,
    iterations_completed: usize,
}

impl<C: Channel> FilterEngine<C> {
    /// Create an engine over `source` with default options and the
    /// built-in filters.
    pub fn new(source: PixelBuffer<C>) -> Self {
        Self::with_options(source, EngineOptions::default())
    }

    /// Create an engine with explicit options.
    pub fn with_options(source: PixelBuffer<C>, options: EngineOptions) -> Self {
        let destination = PixelBuffer::new(source.width(), source.height());

        Self {
            source,
            destination,
            pending_swap: false,
            registry: FilterRegistry::with_builtins(),
            filter: None,
            filter_name: None,
            options,
            pool: None,
            state: EngineState::Idle,
            iterations_completed: 0,
        }
    }

    /// Replace the filter registry used by [`FilterEngine::set_filter`].
    pub fn with_registry(mut self, registry: FilterRegistry<C>) -> Self {
        self.registry = registry;
        self
    }

    /// Resolve a filter by name and arguments.
    ///
    /// On failure the previously selected filter (if any) is kept.
    pub fn set_filter(&mut self, name: &str, args: &[String]) -> Result<(), ConfigError> {
        let filter = self.registry.create(name, args)?;
        self.set_filter_instance(filter);
        Ok(())
    }

    /// Select an already constructed filter.
    pub fn set_filter_instance(&mut self, filter: Box<dyn PixelFilter<C>>) {
        log::debug!("Filter set: {}", filter.id());
        self.filter_name = Some(filter.id().to_string());
        self.filter = Some(filter);
        self.state = EngineState::FilterSet;
    }

    /// Run the selected filter `iterations` times.
    ///
    /// Each call continues from the output of the previous one. Zero
    /// iterations leave the output unchanged.
    pub fn run(&mut self, iterations: usize) -> RasterResult<RunStats> {
        if self.filter.is_none() {
            return Err(ConfigError::FilterNotSet.into());
        }
        self.ensure_pool()?;

        let start_time = Instant::now();
        let height = self.source.height();
        let band_count = self.band_count();
        let row_bands = RowBands::new(height, band_count);
        let rows_per_band = row_bands.rows_per_band();
        let bands: Vec<RowBand> = row_bands.collect();

        log::debug!(
            "Running {} iteration(s): rows={} bands={} rows_per_band={}",
            iterations,
            height,
            bands.len(),
            rows_per_band
        );

        let mut tracker = ProgressTracker::new(height as u64);
        if let Some(callback) = &self.options.progress_callback {
            let callback = callback.clone();
            tracker = tracker.with_callback(Box::new(move |update| callback(update)));
        }
        tracker.start(iterations, bands.len());

        let mut stats = RunStats {
            iterations,
            bands: bands.len(),
            rows_per_band,
            ..RunStats::default()
        };

        for iteration in 0..iterations {
            if self.pending_swap {
                std::mem::swap(&mut self.source, &mut self.destination);
                self.pending_swap = false;
            }

            self.state = EngineState::Running { iteration, iterations };
            tracker.begin_iteration(iteration);
            let iteration_start = Instant::now();

            let Some(filter) = self.filter.as_deref() else {
                return Err(ConfigError::FilterNotSet.into());
            };
            let source = &self.source;
            let writers = self.destination.split_bands_mut(&bands);

            // Returns only after every band task has finished.
            match &self.pool {
                Some(pool) => pool.scope(|scope| dispatch_bands(scope, filter, source, writers, &tracker)),
                None => rayon::scope(|scope| dispatch_bands(scope, filter, source, writers, &tracker)),
            }

            self.pending_swap = true;
            self.iterations_completed += 1;

            let elapsed = iteration_start.elapsed();
            tracker.end_iteration(elapsed.as_millis() as u64);
            stats.iteration_durations.push(elapsed);
            log::debug!("Iteration {}/{} finished in {:?}", iteration + 1, iterations, elapsed);
        }

        self.state = EngineState::Done;
        tracker.complete();
        stats.total_duration = start_time.elapsed();

        log::info!(
            "Applied '{}' {} time(s) in {:?}",
            self.filter_name.as_deref().unwrap_or_default(),
            iterations,
            stats.total_duration
        );

        Ok(stats)
    }

    /// The latest output: the last written buffer, or the source if nothing
    /// has run yet.
    pub fn output(&self) -> &PixelBuffer<C> {
        if self.pending_swap {
            &self.destination
        } else {
            &self.source
        }
    }

    /// Consume the engine, returning the latest output.
    pub fn into_output(self) -> PixelBuffer<C> {
        if self.pending_swap {
            self.destination
        } else {
            self.source
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Identifier of the selected filter.
    pub fn filter_name(&self) -> Option<&str> {
        self.filter_name.as_deref()
    }

    /// Iterations completed over the engine's lifetime.
    pub fn iterations_completed(&self) -> usize {
        self.iterations_completed
    }

    /// Bands requested per iteration.
    pub fn band_count(&self) -> usize {
        if self.options.band_count > 0 {
            return self.options.band_count;
        }
        match &self.pool {
            Some(pool) => pool.current_num_threads().max(1) * BANDS_PER_WORKER,
            None => default_band_count(),
        }
    }

    fn ensure_pool(&mut self) -> RasterResult<()> {
        if self.options.max_threads > 0 && self.pool.is_none() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.max_threads)
                .thread_name(|i| format!("rasterband-{}", i))
                .build()?;
            log::debug!("Built worker pool with {} threads", pool.current_num_threads());
            self.pool = Some(pool);
        }
        Ok(())
    }
}

/// Spawn one task per band.
fn dispatch_bands<'scope, C: Channel>(
    scope: &rayon::Scope<'scope>,
    filter: &'scope dyn PixelFilter<C>,
    source: &'scope PixelBuffer<C>,
    writers: Vec<BandWriter<'scope, C>>,
    tracker: &'scope ProgressTracker,
) {
    for mut writer in writers {
        scope.spawn(move |_| filter.apply(source, &mut writer, tracker));
    }
}

impl<C: Channel> fmt::Debug for FilterEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("source", &self.source)
            .field("filter", &self.filter_name)
            .field("state", &self.state)
            .field("iterations_completed", &self.iterations_completed)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rgba;
    use crate::filters::builtin::{Blur, Invert};
    use parking_lot::Mutex;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn striped(width: u32, height: u32) -> PixelBuffer<u8> {
        PixelBuffer::from_fn(width, height, |x, _| if x % 4 < 2 { RED } else { BLUE })
    }

    #[test]
    fn test_options_builder() {
        let options = EngineOptions::new()
            .with_band_count(6)
            .with_max_threads(2)
            .with_progress(|_| {});

        assert_eq!(options.band_count, 6);
        assert_eq!(options.max_threads, 2);
        assert!(format!("{:?}", options).contains("<callback>"));
    }

    #[test]
    fn test_run_without_filter_fails() {
        let mut engine = FilterEngine::new(striped(4, 4));
        let error = engine.run(1).unwrap_err();
        assert!(matches!(error, crate::core::error::RasterError::Config(ConfigError::FilterNotSet)));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_unknown_filter_keeps_state() {
        let mut engine = FilterEngine::new(striped(4, 4));
        assert!(engine.set_filter("sharpen", &[]).is_err());
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.filter_name(), None);
    }

    #[test]
    fn test_custom_registry_limits_filters() {
        let mut registry = FilterRegistry::new();
        registry.register::<Invert>();
        let mut engine = FilterEngine::new(striped(4, 2)).with_registry(registry);

        assert!(matches!(engine.set_filter("blur", &[]), Err(ConfigError::UnknownFilter { .. })));
        engine.set_filter("invert", &[]).unwrap();
        engine.run(1).unwrap();
        assert_eq!(engine.output().get_pixel(0, 0), Rgba([0, 255, 255, 255]));
    }

    #[test]
    fn test_state_transitions() {
        let mut engine = FilterEngine::new(striped(4, 4));
        assert_eq!(engine.state(), EngineState::Idle);

        engine.set_filter("invert", &[]).unwrap();
        assert_eq!(engine.state(), EngineState::FilterSet);
        assert_eq!(engine.filter_name(), Some("invert"));

        engine.run(2).unwrap();
        assert_eq!(engine.state(), EngineState::Done);
        assert_eq!(engine.iterations_completed(), 2);
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let image = striped(9, 7);
        let mut engine = FilterEngine::new(image.clone());
        engine.set_filter("blur", &[]).unwrap();

        let stats = engine.run(0).unwrap();
        assert_eq!(stats.iterations, 0);
        assert_eq!(engine.output(), &image);
        assert_eq!(engine.into_output(), image);
    }

    #[test]
    fn test_iterations_chain() {
        let image = striped(12, 10);

        let mut once = FilterEngine::new(image.clone());
        once.set_filter("blur", &[]).unwrap();
        once.run(1).unwrap();

        let mut thrice = FilterEngine::new(image.clone());
        thrice.set_filter("blur", &[]).unwrap();
        thrice.run(3).unwrap();

        assert_ne!(once.output(), &image);
        assert_ne!(once.output(), thrice.output());

        // Three single runs equal one run of three.
        let mut stepped = FilterEngine::new(image);
        stepped.set_filter("blur", &[]).unwrap();
        for _ in 0..3 {
            stepped.run(1).unwrap();
        }
        assert_eq!(stepped.output(), thrice.output());
    }

    #[test]
    fn test_invert_twice_restores_input() {
        let image = striped(5, 5);
        let mut engine = FilterEngine::new(image.clone());
        engine.set_filter_instance(Box::new(Invert));
        engine.run(2).unwrap();
        assert_eq!(engine.output(), &image);
    }

    #[test]
    fn test_band_count_does_not_change_output() {
        let image = PixelBuffer::<u16>::from_fn(13, 17, |x, y| Rgba([(x * 997) as u16, (y * 3001) as u16, 5, 65535]));

        let mut reference = FilterEngine::with_options(image.clone(), EngineOptions::new().with_band_count(1));
        reference.set_filter_instance(Box::new(Blur));
        reference.run(2).unwrap();

        for bands in [2, 5, 17, 40] {
            let options = EngineOptions::new().with_band_count(bands).with_max_threads(3);
            let mut engine = FilterEngine::with_options(image.clone(), options);
            engine.set_filter_instance(Box::new(Blur));
            let stats = engine.run(2).unwrap();

            assert!(stats.bands <= bands);
            assert_eq!(engine.output(), reference.output(), "{} bands", bands);
        }
    }

    #[test]
    fn test_progress_reaches_height_each_iteration() {
        let height = 23;
        let updates = Arc::new(Mutex::new(Vec::new()));
        let updates_clone = updates.clone();
        let options = EngineOptions::new()
            .with_band_count(4)
            .with_progress(move |update| updates_clone.lock().push(update));

        let mut engine = FilterEngine::with_options(striped(6, height), options);
        engine.set_filter("edge", &[]).unwrap();
        engine.run(3).unwrap();

        let updates = updates.lock();
        assert!(matches!(updates.first(), Some(ProgressUpdate::Started { iterations: 3, total_rows: 23, .. })));
        assert!(matches!(updates.last(), Some(ProgressUpdate::Completed { iterations: 3, .. })));

        for iteration in 0..3 {
            let rows: Vec<u64> = updates
                .iter()
                .filter_map(|u| match u {
                    ProgressUpdate::Progress { iteration: i, completed_rows, .. } if *i == iteration => {
                        Some(*completed_rows)
                    }
                    _ => None,
                })
                .collect();

            assert!(rows.windows(2).all(|w| w[0] < w[1]), "iteration {}: {:?}", iteration, rows);
            assert_eq!(rows.last().copied(), Some(height as u64));
        }

        let completed = updates
            .iter()
            .filter(|u| matches!(u, ProgressUpdate::IterationCompleted { .. }))
            .count();
        assert_eq!(completed, 3);
    }

    #[test]
    fn test_blur_scenario_through_engine() {
        let mut image = PixelBuffer::filled(4, 4, RED);
        image.put_pixel(1, 1, BLUE);

        let mut engine = FilterEngine::with_options(image, EngineOptions::new().with_band_count(3));
        engine.set_filter("blur", &[]).unwrap();
        let stats = engine.run(1).unwrap();

        assert_eq!(stats.bands, 2);
        assert_eq!(stats.rows_per_band, 2);
        assert_eq!(stats.iteration_durations.len(), 1);
        assert_eq!(engine.output().get_pixel(1, 1), Rgba([204, 0, 51, 255]));
        assert_eq!(engine.output().get_pixel(0, 0), RED);
    }
}
