//! Project root and configuration resolution shared by all commands.

use std::path::{Path, PathBuf};

use attrix_config::{
    load_config_from_str, load_config_or_default, AttrixConfig, ConfigError, CONFIG_FILE_NAME,
};
use attrix_registry::AttributeRegistry;

use crate::GlobalArgs;

/// A loaded project: its root directory and configuration.
pub struct Project {
    /// Directory the configured paths are relative to.
    pub root: PathBuf,
    /// The loaded configuration.
    pub config: AttrixConfig,
}

impl Project {
    /// Creates the registry for this project.
    pub fn registry(&self) -> AttributeRegistry {
        AttributeRegistry::from_config(&self.config, &self.root)
    }
}

/// Walks up from `start` looking for the nearest directory containing `attrix.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project selected by the global flags.
///
/// `--config` may name a configuration file (its directory becomes the root)
/// or a project directory (defaults apply when it has no `attrix.toml`).
/// Without it, the nearest `attrix.toml` above the current directory is used.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let Some(config_path) = &global.config else {
        let root = find_project_root(&std::env::current_dir()?)?;
        let config = load_config_or_default(&root)?;
        return Ok(Project { root, config });
    };

    let path = PathBuf::from(config_path);
    if path.is_file() {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = load_config_from_str(&content)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Project { root, config })
    } else {
        let config = load_config_or_default(&path)?;
        Ok(Project { root: path, config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: config.map(|p| p.to_string_lossy().into_owned()),
        }
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();
        let sub = tmp.path().join("src/Controller");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_project_root(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = find_project_root(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("could not find attrix.toml"));
    }

    #[test]
    fn load_project_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("custom.toml");
        fs::write(&file, "[cache]\nenabled = false\n").unwrap();
        let project = load_project(&global(Some(&file))).unwrap();
        assert_eq!(project.root, tmp.path());
        assert!(!project.config.cache.enabled);
    }

    #[test]
    fn load_project_from_directory_without_config() {
        let tmp = TempDir::new().unwrap();
        let project = load_project(&global(Some(tmp.path()))).unwrap();
        assert_eq!(project.root, tmp.path());
        assert!(project.config.cache.enabled);
        assert!(project.config.plugins.is_empty());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&file, "[scanner]\nmax_file_size = 0\n").unwrap();
        assert!(load_project(&global(Some(&file))).is_err());
    }
}
