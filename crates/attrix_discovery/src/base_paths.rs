//! Base directories, supplied up front or on first use.

use attrix_config::BasePath;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

type Provider = Box<dyn FnOnce() -> Vec<BasePath> + Send>;

/// The base directories scanned by an [`AttributeScanner`](crate::AttributeScanner).
///
/// A deferred provider runs at most once, the first time the paths are
/// needed, and never during construction. Plugin roots are often only known
/// once the host application has finished booting.
pub struct BasePaths {
    resolved: OnceLock<Vec<BasePath>>,
    provider: Mutex<Option<Provider>>,
}

impl BasePaths {
    /// Base paths known up front.
    pub fn fixed(paths: Vec<BasePath>) -> Self {
        Self {
            resolved: OnceLock::from(paths),
            provider: Mutex::new(None),
        }
    }

    /// Base paths computed by `provider` on first use.
    pub fn deferred(provider: impl FnOnce() -> Vec<BasePath> + Send + 'static) -> Self {
        Self {
            resolved: OnceLock::new(),
            provider: Mutex::new(Some(Box::new(provider))),
        }
    }

    /// Returns the base paths, running the deferred provider if needed.
    pub fn get(&self) -> &[BasePath] {
        self.resolved.get_or_init(|| {
            let provider = self
                .provider
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            provider.map(|provide| provide()).unwrap_or_default()
        })
    }

    /// Returns `true` once the paths are known.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl From<Vec<BasePath>> for BasePaths {
    fn from(paths: Vec<BasePath>) -> Self {
        Self::fixed(paths)
    }
}

impl fmt::Debug for BasePaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(paths) => f.debug_tuple("BasePaths").field(paths).finish(),
            None => f.write_str("BasePaths(<deferred>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fixed_paths_are_resolved_immediately() {
        let paths = BasePaths::fixed(vec![BasePath::app("/app")]);
        assert!(paths.is_resolved());
        assert_eq!(paths.get(), &[BasePath::app("/app")]);
    }

    #[test]
    fn deferred_provider_runs_once_on_first_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let paths = BasePaths::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![BasePath::app("/app"), BasePath::plugin("/app/plugins/Blog", "Blog")]
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!paths.is_resolved());
        assert_eq!(paths.get().len(), 2);
        assert_eq!(paths.get().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(format!("{paths:?}").contains("Blog"));
    }
}
