//! The registry: memory, then the record store, then a full scan.

use std::path::Path;

use attrix_cache::{open_store, RecordStore};
use attrix_common::TargetKind;
use attrix_config::AttrixConfig;
use attrix_discovery::{AttributeScanner, ScanStats};
use tracing::{debug, info};

use crate::collection::AttributeCollection;
use crate::events::DiscoveryObserver;

/// Store key of the discovered set.
pub const REGISTRY_KEY: &str = "attribute_discovery";

/// Outcome of [`AttributeRegistry::warm_cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmReport {
    /// Whether the store was cleared.
    pub cleared: bool,
    /// Number of records discovered afterwards.
    pub attributes: usize,
    /// Files that failed to scan during the rebuild.
    pub failed_files: usize,
}

/// Discovers attributes once and answers queries over the result.
///
/// `discover` tries the in-memory set, then the record store, and finally
/// scans every configured file and stores the result. It never fails; scan
/// and store problems are logged by the layers below.
pub struct AttributeRegistry {
    scanner: AttributeScanner,
    store: Box<dyn RecordStore + Send>,
    current: Option<AttributeCollection>,
    last_scan: Option<ScanStats>,
    observers: Vec<Box<dyn DiscoveryObserver>>,
}

impl AttributeRegistry {
    /// Creates a registry over `scanner` and `store`.
    pub fn new(scanner: AttributeScanner, store: Box<dyn RecordStore + Send>) -> Self {
        Self {
            scanner,
            store,
            current: None,
            last_scan: None,
            observers: Vec::new(),
        }
    }

    /// Creates a registry for the project at `project_root`.
    pub fn from_config(config: &AttrixConfig, project_root: &Path) -> Self {
        Self::new(
            AttributeScanner::from_config(config, project_root),
            open_store(config, project_root),
        )
    }

    /// Adds a lifecycle observer.
    pub fn add_observer(&mut self, observer: impl DiscoveryObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Returns every discovered record.
    pub fn discover(&mut self) -> AttributeCollection {
        self.notify(|o| o.before_discover());
        if let Some(current) = &self.current {
            let current = current.clone();
            self.notify(|o| o.after_discover(&current));
            return current;
        }

        let attributes = match self.store.get(REGISTRY_KEY) {
            Some(records) => {
                debug!(records = records.len(), "loaded attributes from cache");
                AttributeCollection::new(records)
            }
            None => self.scan(),
        };
        self.current = Some(attributes.clone());
        self.notify(|o| o.after_discover(&attributes));
        attributes
    }

    /// Returns records whose attribute type contains `name`.
    pub fn find_by_attribute(&mut self, name: &str) -> AttributeCollection {
        self.discover().attribute_contains(name)
    }

    /// Returns records whose owner type contains `name`.
    pub fn find_by_class(&mut self, name: &str) -> AttributeCollection {
        self.discover().owner_contains(name)
    }

    /// Returns records attached to targets of `kind`.
    pub fn find_by_target_type(&mut self, kind: TargetKind) -> AttributeCollection {
        self.discover().with_target_kinds(&[kind])
    }

    /// Drops the in-memory set and clears the store. Returns the store's result.
    pub fn clear_cache(&mut self) -> bool {
        self.notify(|o| o.before_cache_clear());
        self.current = None;
        let cleared = self.store.clear();
        self.notify(|o| o.after_cache_clear(cleared));
        cleared
    }

    /// Clears the cache and discovers again.
    pub fn warm_cache(&mut self) -> WarmReport {
        let cleared = self.clear_cache();
        self.last_scan = None;
        let attributes = self.discover().len();
        let failed_files = self.last_scan.map_or(0, |stats| stats.failed);
        info!(attributes, failed_files, "attribute cache warmed");
        WarmReport {
            cleared,
            attributes,
            failed_files,
        }
    }

    /// Returns `true` if the store persists anything.
    pub fn is_cache_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    /// Returns the counters of the last scan run by this registry.
    pub fn last_scan_stats(&self) -> Option<ScanStats> {
        self.last_scan
    }

    /// Returns the scanner.
    pub fn scanner(&self) -> &AttributeScanner {
        &self.scanner
    }

    fn scan(&mut self) -> AttributeCollection {
        self.notify(|o| o.before_scan());
        let attributes: AttributeCollection = self.scanner.scan_all().collect();
        let stats = self.scanner.last_scan_stats();
        self.last_scan = Some(stats);
        debug!(
            records = attributes.len(),
            scanned = stats.scanned,
            skipped = stats.skipped,
            failed = stats.failed,
            "scanned attributes"
        );
        if !self.store.set(REGISTRY_KEY, attributes.as_slice()) {
            debug!("discovered attributes were not cached");
        }
        self.notify(|o| o.after_scan(&attributes));
        attributes
    }

    fn notify(&mut self, mut event: impl FnMut(&mut dyn DiscoveryObserver)) {
        for observer in &mut self.observers {
            event(observer.as_mut());
        }
    }
}

impl std::fmt::Debug for AttributeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeRegistry")
            .field("scanner", &self.scanner)
            .field("cache_enabled", &self.store.is_enabled())
            .field("discovered", &self.current.as_ref().map(AttributeCollection::len))
            .field("observers", &self.observers.len())
            .finish()
    }
}
