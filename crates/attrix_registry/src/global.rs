//! Optional process-wide registry holder.
//!
//! Nothing in this workspace reads the holder implicitly. Hosts that want a
//! single shared registry install one at startup and fetch it where needed.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::registry::AttributeRegistry;

/// A registry shared through the holder.
pub type SharedRegistry = Arc<Mutex<AttributeRegistry>>;

static INSTALLED: Mutex<Option<SharedRegistry>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<SharedRegistry>> {
    INSTALLED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Installs `registry` as the process-wide instance, replacing any previous
/// one, and returns the shared handle.
pub fn install(registry: AttributeRegistry) -> SharedRegistry {
    let shared = Arc::new(Mutex::new(registry));
    *slot() = Some(Arc::clone(&shared));
    shared
}

/// Returns the installed registry.
pub fn get() -> Option<SharedRegistry> {
    slot().clone()
}

/// Removes the installed registry. Handles already handed out stay usable.
pub fn reset() -> Option<SharedRegistry> {
    slot().take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrix_config::AttrixConfig;

    #[test]
    fn install_get_reset() {
        let dir = tempfile::tempdir().unwrap();
        let registry = AttributeRegistry::from_config(&AttrixConfig::default(), dir.path());
        let handle = install(registry);
        let fetched = get().unwrap();
        assert!(Arc::ptr_eq(&handle, &fetched));

        assert!(reset().is_some());
        assert!(get().is_none());
        assert!(reset().is_none());

        let mut registry = handle.lock().unwrap();
        assert!(registry.discover().is_empty());
    }
}
