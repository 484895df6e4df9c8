//! Lifecycle notifications emitted by the registry.

use crate::collection::AttributeCollection;

/// Receives registry lifecycle events. Every hook defaults to doing nothing.
///
/// On a cache miss `discover` emits `before_discover`, `before_scan`,
/// `after_scan` and `after_discover` in that order. A cache hit emits only
/// `before_discover` and `after_discover`.
pub trait DiscoveryObserver: Send {
    /// Discovery is starting.
    fn before_discover(&mut self) {}

    /// Discovery finished with `attributes`.
    fn after_discover(&mut self, _attributes: &AttributeCollection) {}

    /// No cached set was found; a scan is starting.
    fn before_scan(&mut self) {}

    /// The scan produced `attributes`.
    fn after_scan(&mut self, _attributes: &AttributeCollection) {}

    /// The cache is about to be cleared.
    fn before_cache_clear(&mut self) {}

    /// The cache was cleared; `success` is the store's result.
    fn after_cache_clear(&mut self, _success: bool) {}
}

/// A lifecycle event, as recorded by [`EventLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// See [`DiscoveryObserver::before_discover`].
    BeforeDiscover,
    /// See [`DiscoveryObserver::after_discover`]; carries the record count.
    AfterDiscover(usize),
    /// See [`DiscoveryObserver::before_scan`].
    BeforeScan,
    /// See [`DiscoveryObserver::after_scan`]; carries the record count.
    AfterScan(usize),
    /// See [`DiscoveryObserver::before_cache_clear`].
    BeforeCacheClear,
    /// See [`DiscoveryObserver::after_cache_clear`].
    AfterCacheClear(bool),
}

/// Observer that appends every event to a shared list.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: std::sync::Arc<std::sync::Mutex<Vec<DiscoveryEvent>>>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    pub fn events(&self) -> Vec<DiscoveryEvent> {
        self.lock().clone()
    }

    /// Removes and returns the recorded events.
    pub fn take(&self) -> Vec<DiscoveryEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn push(&self, event: DiscoveryEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DiscoveryEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiscoveryObserver for EventLog {
    fn before_discover(&mut self) {
        self.push(DiscoveryEvent::BeforeDiscover);
    }

    fn after_discover(&mut self, attributes: &AttributeCollection) {
        self.push(DiscoveryEvent::AfterDiscover(attributes.len()));
    }

    fn before_scan(&mut self) {
        self.push(DiscoveryEvent::BeforeScan);
    }

    fn after_scan(&mut self, attributes: &AttributeCollection) {
        self.push(DiscoveryEvent::AfterScan(attributes.len()));
    }

    fn before_cache_clear(&mut self) {
        self.push(DiscoveryEvent::BeforeCacheClear);
    }

    fn after_cache_clear(&mut self, success: bool) {
        self.push(DiscoveryEvent::AfterCacheClear(success));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_clones_share_events() {
        let log = EventLog::new();
        let mut observer = log.clone();
        observer.before_discover();
        observer.after_discover(&AttributeCollection::default());
        assert_eq!(
            log.take(),
            vec![DiscoveryEvent::BeforeDiscover, DiscoveryEvent::AfterDiscover(0)]
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn default_hooks_do_nothing() {
        struct Silent;
        impl DiscoveryObserver for Silent {}
        let mut silent = Silent;
        silent.before_scan();
        silent.after_cache_clear(true);
    }
}
