//! Filter registry for resolving filters by name.

use crate::core::error::ConfigError;
use crate::core::filter::{Category, FilterDescriptor, FilterMetadata, PixelFilter};
use crate::core::types::Channel;
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory function building a filter from its positional arguments.
pub type FilterFactory<C> = Arc<dyn Fn(&[String]) -> Result<Box<dyn PixelFilter<C>>, ConfigError> + Send + Sync>;

/// Registry entry containing metadata and factory.
pub struct RegistryEntry<C: Channel> {
    /// Factory function to create instances.
    pub factory: FilterFactory<C>,
    /// Cached metadata (avoids parsing arguments just to describe a filter).
    pub metadata: FilterMetadata,
}

impl<C: Channel> Clone for RegistryEntry<C> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            metadata: self.metadata.clone(),
        }
    }
}

/// Registry of the filters available for channel type `C`.
///
/// Filters are kept in registration order, which is also the order of
/// `list` output.
pub struct FilterRegistry<C: Channel> {
    /// Filters indexed by their unique ID.
    filters: IndexMap<String, RegistryEntry<C>>,
    /// Filter IDs grouped by category.
    categories: IndexMap<Category, Vec<String>>,
}

impl<C: Channel> FilterRegistry<C> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
            categories: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with built-in filters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Register a filter type.
    pub fn register<F>(&mut self)
    where
        F: FilterDescriptor + PixelFilter<C> + 'static,
    {
        self.register_factory(
            F::metadata(),
            Arc::new(|args: &[String]| F::from_args(args).map(|f| Box::new(f) as Box<dyn PixelFilter<C>>)),
        );
    }

    /// Register a filter under explicit metadata and factory.
    ///
    /// A filter registered under an existing ID replaces it.
    pub fn register_factory(&mut self, metadata: FilterMetadata, factory: FilterFactory<C>) {
        let id = metadata.id.clone();
        let category = metadata.category;

        if let Some(previous) = self.filters.insert(id.clone(), RegistryEntry { factory, metadata }) {
            if let Some(ids) = self.categories.get_mut(&previous.metadata.category) {
                ids.retain(|i| i != &id);
            }
        }

        self.categories.entry(category).or_default().push(id);
    }

    /// Resolve `name` and build the filter from `args`.
    ///
    /// Names are matched case-insensitively. Fails with
    /// [`ConfigError::UnknownFilter`] for unregistered names and
    /// [`ConfigError::MissingArgument`] when fewer arguments than the
    /// filter's required ones are given.
    pub fn create(&self, name: &str, args: &[String]) -> Result<Box<dyn PixelFilter<C>>, ConfigError> {
        let entry = self.get_entry(name).ok_or_else(|| ConfigError::UnknownFilter {
            name: name.to_string(),
        })?;

        if args.len() < entry.metadata.required_arguments() {
            return Err(ConfigError::MissingArgument {
                filter: entry.metadata.id.clone(),
                expected: entry.metadata.required_argument_names(),
            });
        }

        (entry.factory)(args)
    }

    /// Get metadata for a filter without creating an instance.
    pub fn get_metadata(&self, name: &str) -> Option<&FilterMetadata> {
        self.get_entry(name).map(|e| &e.metadata)
    }

    /// Get a registry entry.
    pub fn get_entry(&self, name: &str) -> Option<&RegistryEntry<C>> {
        self.filters
            .get(name)
            .or_else(|| self.filters.get(name.trim().to_ascii_lowercase().as_str()))
    }

    /// Check if a filter is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get_entry(name).is_some()
    }

    /// Get all registered filter IDs.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|s| s.as_str())
    }

    /// Get filters by category.
    pub fn filters_by_category(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|ids| ids.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Get the total number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Get filters grouped by category for listings.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<&FilterMetadata>> {
        let mut grouped: IndexMap<Category, Vec<&FilterMetadata>> = IndexMap::new();

        for entry in self.filters.values() {
            grouped.entry(entry.metadata.category).or_default().push(&entry.metadata);
        }

        for filters in grouped.values_mut() {
            filters.sort_by(|a, b| a.name.cmp(&b.name));
        }

        grouped
    }
}

impl<C: Channel> Default for FilterRegistry<C> {
    fn default() -> Self {
        Self::with_builtins()
    }
}
