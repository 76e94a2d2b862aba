//! PixelFilter trait and filter metadata.
//!
//! A filter is resolved once by name (see [`FilterRegistry`]) and then
//! applied band by band: every call to [`PixelFilter::apply`] reads the
//! whole source buffer and writes only the rows of its own band.
//!
//! [`FilterRegistry`]: crate::filters::FilterRegistry

use crate::core::error::ConfigError;
use crate::core::iterator::NeighborMode;
use crate::core::types::{BandWriter, Channel, PixelBuffer};
use crate::execution::progress::ProgressTracker;
use std::str::FromStr;

/// Category for grouping filters in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Color mapping (invert, posterize, heat map)
    Color,
    /// Blur effects
    Blur,
    /// Edge detection
    Edge,
    /// Lighting effects
    Light,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Color => "Color",
            Category::Blur => "Blur",
            Category::Edge => "Edge",
            Category::Light => "Light",
        }
    }
}

/// Value kind of a positional filter argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
    /// Free-form word
    Word,
}

/// Definition of one positional filter argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    /// Argument name (used in messages)
    pub name: String,
    /// Value kind
    pub kind: ArgumentKind,
    /// Default value, `None` if the argument is required
    pub default_value: Option<String>,
    /// Description for `info` output
    pub description: String,
}

impl ParameterDefinition {
    /// A required argument.
    pub fn required(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value: None,
            description: String::new(),
        }
    }

    /// An optional argument with a default.
    pub fn optional(name: impl Into<String>, kind: ArgumentKind, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value: Some(default.into()),
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the argument must be given.
    pub fn is_required(&self) -> bool {
        self.default_value.is_none()
    }
}

/// Metadata describing a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterMetadata {
    /// Unique identifier, also the name used on the command line (e.g., "blur")
    pub id: String,
    /// Human-readable name (e.g., "Box Blur")
    pub name: String,
    /// Category for listings
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Neighbors the filter reads per pixel
    pub neighbor_mode: NeighborMode,
    /// Positional arguments, in order
    pub parameters: Vec<ParameterDefinition>,
}

impl FilterMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> FilterMetadataBuilder {
        FilterMetadataBuilder::new(id, name)
    }

    /// Number of arguments that must be given.
    pub fn required_arguments(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_required()).count()
    }

    /// Human readable list of the required argument names, e.g. "x, y, radius".
    pub fn required_argument_names(&self) -> String {
        self.parameters
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builder for FilterMetadata.
pub struct FilterMetadataBuilder {
    metadata: FilterMetadata,
}

impl FilterMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: FilterMetadata {
                id: id.into(),
                name: name.into(),
                category: Category::Color,
                description: String::new(),
                neighbor_mode: NeighborMode::None,
                parameters: Vec::new(),
            },
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.metadata.category = category;
        self
    }

    /// Set the neighbor mode.
    pub fn neighbor_mode(mut self, mode: NeighborMode) -> Self {
        self.metadata.neighbor_mode = mode;
        self
    }

    /// Append a positional argument.
    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.metadata.parameters.push(parameter);
        self
    }

    /// Build the metadata.
    pub fn build(self) -> FilterMetadata {
        self.metadata
    }
}

/// A per-band image filter for channel type `C`.
///
/// Implementations must only write rows inside `target.band()`; the writer
/// enforces this. Completed rows are reported to `progress` through the
/// [`NeighborIterator`](crate::core::iterator::NeighborIterator).
pub trait PixelFilter<C: Channel>: Send + Sync {
    /// Filter identifier, as registered.
    fn id(&self) -> &'static str;

    /// Apply the filter to one band of `source`, writing into `target`.
    fn apply(&self, source: &PixelBuffer<C>, target: &mut BandWriter<'_, C>, progress: &ProgressTracker);
}

/// Static description and argument parsing for a filter type.
pub trait FilterDescriptor: Sized {
    /// Metadata for listings and argument validation.
    fn metadata() -> FilterMetadata;

    /// Build an instance from positional string arguments.
    fn from_args(args: &[String]) -> Result<Self, ConfigError>;
}

/// Parse optional positional argument `index`.
///
/// Returns `Ok(None)` when the argument was not given.
pub fn parse_argument<T>(filter: &str, args: &[String], index: usize, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match args.get(index) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidArgument {
                filter: filter.to_string(),
                argument: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Build an [`ConfigError::InvalidArgument`] for a value that parsed but is out of range.
pub fn invalid_argument(filter: &str, name: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidArgument {
        filter: filter.to_string(),
        argument: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
