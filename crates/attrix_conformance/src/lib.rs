//! End-to-end test helpers for attrix.
//!
//! Provides on-disk PHP projects in temporary directories and shortcuts for
//! building configured registries over them, for assertion in the scenario
//! tests under `tests/`.

#![warn(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use attrix_config::{load_config_from_str, AttrixConfig};
use attrix_registry::{AttributeRegistry, EventLog};
use tempfile::TempDir;

/// A controller with one class-level, one property and two method attributes.
pub const USERS_CONTROLLER: &str = r#"<?php
declare(strict_types=1);

namespace App\Controller;

use App\Attribute\Route;
use App\Attribute\Inject;

#[Route(path: "/users", method: "GET")]
class UsersController
{
    #[Inject]
    private UserService $users;

    #[Route(path: "/users/list")]
    public function index(): array
    {
        return [];
    }

    #[Route(path: "/users/{id}")]
    public function view(int $id): array
    {
        return [];
    }
}
"#;

/// A controller nested one namespace below `App\Controller`.
pub const POSTS_CONTROLLER: &str = r#"<?php
namespace App\Controller\Api;

use App\Attribute\Route;

#[Route("/api/posts")]
final class PostsController
{
}
"#;

/// The attribute class used by the fixtures, with a known constructor.
pub const ROUTE_ATTRIBUTE: &str = r#"<?php
namespace App\Attribute;

#[\Attribute(\Attribute::TARGET_CLASS | \Attribute::TARGET_METHOD)]
final class Route
{
    public function __construct(
        public string $path,
        public string $method = 'GET',
        public ?string $name = null,
    ) {
    }
}
"#;

/// A temporary project directory.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Creates an empty project.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Creates a project containing `files` (relative path, content).
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let project = Self::new();
        for (path, content) in files {
            project.write(path, content);
        }
        project
    }

    /// Returns the project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the absolute path of `relative`.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Returns the default cache directory of this project.
    pub fn cache_dir(&self) -> PathBuf {
        self.path(attrix_config::DEFAULT_CACHE_PATH)
    }

    /// Returns the files currently in the cache directory, sorted.
    pub fn cache_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match fs::read_dir(self.cache_dir()) {
            Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    /// Creates a registry from `attrix.toml` text.
    pub fn registry(&self, config: &str) -> AttributeRegistry {
        AttributeRegistry::from_config(&make_config(config), self.root())
    }

    /// Creates a registry that records its lifecycle events in the returned log.
    pub fn registry_with_log(&self, config: &str) -> (AttributeRegistry, EventLog) {
        let mut registry = self.registry(config);
        let log = EventLog::new();
        registry.add_observer(log.clone());
        (registry, log)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses and validates `attrix.toml` text.
pub fn make_config(toml: &str) -> AttrixConfig {
    load_config_from_str(toml).unwrap()
}
