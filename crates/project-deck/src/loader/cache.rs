//! Process-wide memoization of the loaded dataset.
//!
//! The cache holds a single entry. It is reused while the resolved source file
//! has the same path and modification time and the configuration is unchanged;
//! anything else triggers a fresh load. Only successful loads are stored.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::Loader;
use super::discovery::FileIdentity;
use crate::config::{LoaderConfig, ResolverConfig};
use crate::error::Result;
use crate::records::Dataset;
use crate::resolver::FieldResolver;

static DATASET_CACHE: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

#[derive(Debug)]
struct CacheEntry {
    identity: FileIdentity,
    loader_config: LoaderConfig,
    dataset: Arc<Dataset>,
}

impl CacheEntry {
    fn matches(&self, identity: &FileIdentity, loader: &Loader, resolver: &FieldResolver) -> bool {
        self.identity == *identity
            && self.loader_config == *loader.config()
            && self.dataset.resolver().config() == resolver.config()
    }
}

/// Single-entry dataset cache.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset when it is still current, otherwise load,
    /// resolve and store a new one.
    ///
    /// The lock is held for the whole load so concurrent callers never parse
    /// the same file twice.
    pub fn get_or_load(&self, loader: &Loader, resolver: &FieldResolver) -> Result<Arc<Dataset>> {
        let path = loader.resolve_source()?;
        let identity = FileIdentity::of(&path)?;

        let mut entry = self.entry.lock();
        if let Some(cached) = entry.as_ref()
            && cached.matches(&identity, loader, resolver)
        {
            debug!("Cache hit for {}", path.display());
            return Ok(Arc::clone(&cached.dataset));
        }

        let loaded = loader.load_from(&path)?;
        let dataset = Arc::new(Dataset::new(loaded, resolver.clone()));
        info!("Cached dataset from {}", path.display());

        *entry = Some(CacheEntry {
            identity,
            loader_config: loader.config().clone(),
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }

    /// Drop the cached entry, if any.
    pub fn clear(&self) {
        *self.entry.lock() = None;
    }

    pub fn is_cached(&self) -> bool {
        self.entry.lock().is_some()
    }
}

/// Load the dataset through the process-wide cache.
///
/// The resolver's `name_header` also drives the repeated-header-row drop, so
/// the loader's own `name_header` is replaced by it.
pub fn load_dataset(
    loader_config: &LoaderConfig,
    resolver_config: &ResolverConfig,
) -> Result<Arc<Dataset>> {
    let loader = Loader::new(LoaderConfig {
        name_header: resolver_config.name_header.clone(),
        ..loader_config.clone()
    });
    let resolver = FieldResolver::new(resolver_config.clone());
    DATASET_CACHE.get_or_load(&loader, &resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Loader, FieldResolver) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("data.csv"),
            "Project Name,Developer\nMarina View,Emaar\n",
        )
        .unwrap();
        let loader = Loader::new(
            LoaderConfig::builder()
                .working_dir(dir.path())
                .build()
                .unwrap(),
        );
        (dir, loader, FieldResolver::default())
    }

    #[test]
    fn test_second_call_returns_same_dataset() {
        let (_dir, loader, resolver) = setup();
        let cache = DatasetCache::new();

        let first = cache.get_or_load(&loader, &resolver).unwrap();
        let second = cache.get_or_load(&loader, &resolver).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_cached());
    }

    #[test]
    fn test_modified_file_is_reloaded() {
        let (dir, loader, resolver) = setup();
        let cache = DatasetCache::new();
        let first = cache.get_or_load(&loader, &resolver).unwrap();

        let path = dir.path().join("data.csv");
        fs::write(&path, "Project Name,Developer\nMarina View,Emaar\nCreek Rise,Nakheel\n")
            .unwrap();
        let later = SystemTime::now() + Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.get_or_load(&loader, &resolver).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.table().height(), 2);
    }

    #[test]
    fn test_changed_resolver_config_is_a_miss() {
        let (_dir, loader, resolver) = setup();
        let cache = DatasetCache::new();
        let first = cache.get_or_load(&loader, &resolver).unwrap();

        let stricter = FieldResolver::new(
            ResolverConfig::builder().min_name_length(3).build().unwrap(),
        );
        let second = cache.get_or_load(&loader, &stricter).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_load_dataset_uses_resolver_name_header() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("data.csv"),
            "Tower,Developer\nMarina View,Emaar\nTower,Developer\nCreek Rise,Nakheel\n",
        )
        .unwrap();
        let loader_config = LoaderConfig::builder()
            .working_dir(dir.path())
            .build()
            .unwrap();
        let resolver_config = ResolverConfig::builder().name_header("Tower").build().unwrap();

        let dataset = load_dataset(&loader_config, &resolver_config).unwrap();
        assert_eq!(dataset.table().height(), 2);
        let names: Vec<String> = dataset.records().map(|r| r.name).collect();
        assert_eq!(names, vec!["Marina View", "Creek Rise"]);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let loader = Loader::new(
            LoaderConfig::builder()
                .working_dir(dir.path())
                .build()
                .unwrap(),
        );
        let cache = DatasetCache::new();

        let result = cache.get_or_load(&loader, &FieldResolver::default());
        assert!(matches!(result, Err(LoadError::NoFileFound { .. })));
        assert!(!cache.is_cached());

        cache.clear();
        assert!(!cache.is_cached());
    }
}
