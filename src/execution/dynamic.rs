//! Depth dispatch over [`FilterEngine`].

use crate::core::error::{ConfigError, RasterResult};
use crate::core::types::{ChannelDepth, DynamicBuffer};
use crate::execution::engine::{EngineOptions, EngineState, FilterEngine, RunStats};
use std::path::{Path, PathBuf};

/// A [`FilterEngine`] for whichever depth the input image has.
#[derive(Debug)]
pub enum DynamicEngine {
    /// 8 bits per channel.
    Rgba8(FilterEngine<u8>),
    /// 16 bits per channel.
    Rgba16(FilterEngine<u16>),
}

macro_rules! with_engine {
    ($self:expr, $engine:ident => $body:expr) => {
        match $self {
            DynamicEngine::Rgba8($engine) => $body,
            DynamicEngine::Rgba16($engine) => $body,
        }
    };
}

impl DynamicEngine {
    /// Create an engine matching the depth of `buffer`.
    pub fn new(buffer: DynamicBuffer, options: EngineOptions) -> Self {
        match buffer {
            DynamicBuffer::Rgba8(b) => DynamicEngine::Rgba8(FilterEngine::with_options(b, options)),
            DynamicBuffer::Rgba16(b) => DynamicEngine::Rgba16(FilterEngine::with_options(b, options)),
        }
    }

    /// Channel depth of the image being filtered.
    pub fn depth(&self) -> ChannelDepth {
        match self {
            DynamicEngine::Rgba8(_) => ChannelDepth::Eight,
            DynamicEngine::Rgba16(_) => ChannelDepth::Sixteen,
        }
    }

    /// Resolve a filter by name and arguments.
    pub fn set_filter(&mut self, name: &str, args: &[String]) -> Result<(), ConfigError> {
        with_engine!(self, engine => engine.set_filter(name, args))
    }

    /// Run the selected filter `iterations` times.
    pub fn run(&mut self, iterations: usize) -> RasterResult<RunStats> {
        with_engine!(self, engine => engine.run(iterations))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        with_engine!(self, engine => engine.state())
    }

    /// Identifier of the selected filter.
    pub fn filter_name(&self) -> Option<&str> {
        with_engine!(self, engine => engine.filter_name())
    }

    /// Image dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        with_engine!(self, engine => engine.output().dimensions())
    }

    /// Consume the engine, returning the latest output.
    pub fn into_output(self) -> DynamicBuffer {
        match self {
            DynamicEngine::Rgba8(engine) => DynamicBuffer::Rgba8(engine.into_output()),
            DynamicEngine::Rgba16(engine) => DynamicBuffer::Rgba16(engine.into_output()),
        }
    }

    /// Consume the engine and encode its output as PNG at `path`.
    pub fn write_output(self, path: impl AsRef<Path>) -> RasterResult<PathBuf> {
        crate::io::write_image(path, &self.into_output())
    }
}
