//! Lazy scanning of every configured file into attribute records.

use crate::attribute_parser::AttributeParser;
use crate::base_paths::BasePaths;
use crate::path_resolver::resolve_under;
use attrix_common::pattern::matches_any;
use attrix_common::{AttributeRecord, NamePattern};
use attrix_config::{
    resolve_autoload, resolve_base_paths, AttrixConfig, AutoloadRoot, BasePath, ScannerConfig,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::cell::Cell;
use std::path::Path;
use tracing::{debug, warn};

/// File counters of the most recent scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Files handed to the parser.
    pub scanned: usize,
    /// Files dropped by an exclusion pattern or the size limit.
    pub skipped: usize,
    /// Files that could not be inspected or parsed.
    pub failed: usize,
}

/// Produces the attribute records of every file matched by the configured
/// patterns under every base path.
///
/// Scanning is lazy and single threaded: files are parsed one at a time as
/// the iterator returned by [`scan_all`](Self::scan_all) is advanced. A
/// failing file is logged and contributes no records.
#[derive(Debug)]
pub struct AttributeScanner {
    parser: AttributeParser,
    base_paths: BasePaths,
    paths: Vec<String>,
    excludes: GlobSet,
    exclude_attributes: Vec<NamePattern>,
    max_file_size: u64,
    stats: Cell<ScanStats>,
}

impl AttributeScanner {
    /// Creates a scanner from scanner settings.
    pub fn new(config: &ScannerConfig, base_paths: BasePaths, autoload: Vec<AutoloadRoot>) -> Self {
        Self {
            parser: AttributeParser::new(autoload),
            base_paths,
            paths: config.paths.clone(),
            excludes: build_excludes(&config.exclude_paths),
            exclude_attributes: config
                .exclude_attributes
                .iter()
                .map(|p| NamePattern::new(p))
                .collect(),
            max_file_size: config.max_file_size,
            stats: Cell::new(ScanStats::default()),
        }
    }

    /// Creates a scanner for a project: the project root and every configured
    /// plugin root are scanned, and autoload directories are resolved against
    /// the project root.
    pub fn from_config(config: &AttrixConfig, project_root: &Path) -> Self {
        Self::new(
            &config.scanner,
            BasePaths::fixed(resolve_base_paths(config, project_root)),
            resolve_autoload(config, project_root),
        )
    }

    /// Returns every record of every matched file, file by file.
    ///
    /// Each call starts a fresh walk and resets [`last_scan_stats`](Self::last_scan_stats).
    pub fn scan_all(&self) -> impl Iterator<Item = AttributeRecord> + '_ {
        self.stats.set(ScanStats::default());
        self.base_paths.get().iter().flat_map(move |base| {
            resolve_under(&base.root, &self.paths).flat_map(move |path| self.scan_file(base, &path))
        })
    }

    /// Returns the counters of the current or most recent scan.
    pub fn last_scan_stats(&self) -> ScanStats {
        self.stats.get()
    }

    /// Returns the base paths, resolving deferred ones.
    pub fn base_paths(&self) -> &[BasePath] {
        self.base_paths.get()
    }

    fn scan_file(&self, base: &BasePath, path: &Path) -> Vec<AttributeRecord> {
        if self.is_excluded(&base.root, path) {
            debug!(path = %path.display(), "skipping excluded file");
            self.count(|s| s.skipped += 1);
            return Vec::new();
        }
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.max_file_size => {
                debug!(path = %path.display(), size = meta.len(), "skipping oversized file");
                self.count(|s| s.skipped += 1);
                return Vec::new();
            }
            Ok(_) => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to scan file");
                self.count(|s| s.failed += 1);
                return Vec::new();
            }
        }

        self.count(|s| s.scanned += 1);
        match self.parser.parse_file_report(path) {
            Ok(report) => {
                if let Some(problem) = &report.problem {
                    warn!(path = %path.display(), problem = %problem, "file was not fully scanned");
                    self.count(|s| s.failed += 1);
                }
                report
                    .records
                    .into_iter()
                    .filter(|r| !matches_any(&self.exclude_attributes, &r.attribute_type))
                    .map(|mut r| {
                        r.owning_plugin_name = base.plugin.clone();
                        r
                    })
                    .collect()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to scan file");
                self.count(|s| s.failed += 1);
                Vec::new()
            }
        }
    }

    /// Exclusions match the path relative to its base or the absolute path.
    fn is_excluded(&self, base: &Path, path: &Path) -> bool {
        if self.excludes.is_empty() {
            return false;
        }
        path.strip_prefix(base)
            .is_ok_and(|relative| self.excludes.is_match(relative))
            || self.excludes.is_match(path)
    }

    fn count(&self, update: impl FnOnce(&mut ScanStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

/// Builds the exclusion set. Wildcards may cross `/`; invalid patterns are
/// logged and ignored.
fn build_excludes(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // A leading `/` anchors at the base path; the pattern as written also
        // matches absolute paths.
        let relative = pattern.trim_start_matches('/');
        let mut forms = vec![pattern.as_str()];
        if relative.len() != pattern.len() {
            forms.push(relative);
        }
        for form in forms {
            match Glob::new(form) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "ignoring invalid exclude pattern");
                    break;
                }
            }
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring exclude patterns");
        GlobSet::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const MARKED: &str = "<?php\nnamespace App;\n#[Marker]\nclass Thing {}\n";

    fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn scanner(dir: &Path, config: ScannerConfig) -> AttributeScanner {
        AttributeScanner::new(
            &config,
            BasePaths::fixed(vec![BasePath::app(dir)]),
            Vec::new(),
        )
    }

    fn files(records: &[AttributeRecord]) -> Vec<PathBuf> {
        records.iter().map(|r| r.source_file.clone()).collect()
    }

    #[test]
    fn scans_matching_files_in_order() {
        let dir = project(&[("src/A.php", MARKED), ("src/B.php", MARKED), ("src/c.txt", MARKED)]);
        let scanner = scanner(dir.path(), ScannerConfig::default());
        let records: Vec<_> = scanner.scan_all().collect();
        assert_eq!(
            files(&records),
            vec![dir.path().join("src/A.php"), dir.path().join("src/B.php")]
        );
        assert_eq!(
            scanner.last_scan_stats(),
            ScanStats {
                scanned: 2,
                skipped: 0,
                failed: 0
            }
        );
    }

    #[test]
    fn excluded_paths_are_never_scanned() {
        let dir = project(&[
            ("src/A.php", MARKED),
            ("src/Legacy/Old.php", MARKED),
            ("src/Legacy/Deep/Older.php", MARKED),
        ]);
        let config = ScannerConfig {
            exclude_paths: vec!["src/Legacy/*".into()],
            ..ScannerConfig::default()
        };
        let scanner = scanner(dir.path(), config);
        let records: Vec<_> = scanner.scan_all().collect();
        assert_eq!(files(&records), vec![dir.path().join("src/A.php")]);
        assert_eq!(scanner.last_scan_stats().skipped, 2);
    }

    #[test]
    fn exclusion_by_absolute_path() {
        let dir = project(&[("src/A.php", MARKED), ("src/B.php", MARKED)]);
        let absolute = format!("{}/src/B.php", dir.path().display());
        let config = ScannerConfig {
            exclude_paths: vec![absolute],
            ..ScannerConfig::default()
        };
        let records: Vec<_> = scanner(dir.path(), config).scan_all().collect();
        assert_eq!(files(&records), vec![dir.path().join("src/A.php")]);
    }

    #[test]
    fn oversized_files_are_skipped() {
        let big = format!("{MARKED}/*{}*/\n", "x".repeat(4096));
        let dir = project(&[("src/Big.php", big.as_str()), ("src/Small.php", MARKED)]);
        let config = ScannerConfig {
            max_file_size: 1024,
            ..ScannerConfig::default()
        };
        let scanner = scanner(dir.path(), config);
        let records: Vec<_> = scanner.scan_all().collect();
        assert_eq!(files(&records), vec![dir.path().join("src/Small.php")]);
        assert_eq!(scanner.last_scan_stats().skipped, 1);
        assert_eq!(scanner.last_scan_stats().scanned, 1);
    }

    #[test]
    fn excluded_attributes_are_dropped() {
        let source = "<?php\n#[Psalm\\Pure]\n#[JetBrains\\Immutable]\n#[Keep]\nclass K {}\n";
        let dir = project(&[("src/K.php", source)]);
        let config = ScannerConfig {
            exclude_attributes: vec!["Psalm\\*".into(), "\\JetBrains\\Immutable".into()],
            ..ScannerConfig::default()
        };
        let records: Vec<_> = scanner(dir.path(), config).scan_all().collect();
        let types: Vec<&str> = records.iter().map(|r| r.attribute_type.as_str()).collect();
        assert_eq!(types, vec!["Keep"]);
    }

    #[test]
    fn records_are_tagged_with_plugin() {
        let app = project(&[("src/A.php", MARKED)]);
        let plugin = project(&[("src/P.php", MARKED)]);
        let scanner = AttributeScanner::new(
            &ScannerConfig::default(),
            BasePaths::fixed(vec![
                BasePath::app(app.path()),
                BasePath::plugin(plugin.path(), "Blog"),
            ]),
            Vec::new(),
        );
        let plugins: Vec<Option<String>> =
            scanner.scan_all().map(|r| r.owning_plugin_name).collect();
        assert_eq!(plugins, vec![None, Some("Blog".to_string())]);
    }

    #[test]
    fn deferred_base_paths_resolve_on_first_scan() {
        let dir = project(&[("src/A.php", MARKED)]);
        let root = dir.path().to_path_buf();
        let scanner = AttributeScanner::new(
            &ScannerConfig::default(),
            BasePaths::deferred(move || vec![BasePath::app(root)]),
            Vec::new(),
        );
        assert!(!scanner.base_paths.is_resolved());
        assert_eq!(scanner.scan_all().count(), 1);
        assert!(scanner.base_paths.is_resolved());
    }

    #[test]
    fn scan_is_lazy_and_restartable() {
        let dir = project(&[("src/A.php", MARKED), ("src/B.php", MARKED)]);
        let scanner = scanner(dir.path(), ScannerConfig::default());
        let mut iter = scanner.scan_all();
        assert!(iter.next().is_some());
        drop(iter);
        assert_eq!(scanner.last_scan_stats().scanned, 1);
        assert_eq!(scanner.scan_all().count(), 2);
        assert_eq!(scanner.last_scan_stats().scanned, 2);
    }

    #[test]
    fn broken_files_contribute_nothing() {
        let dir = project(&[
            ("src/A.php", "<?php\n#[Broken(\nclass A {\n"),
            ("src/B.php", MARKED),
        ]);
        let scanner = scanner(dir.path(), ScannerConfig::default());
        let records: Vec<_> = scanner.scan_all().collect();
        assert_eq!(files(&records), vec![dir.path().join("src/B.php")]);
        assert_eq!(scanner.last_scan_stats().failed, 1);
    }

    #[test]
    fn unreadable_and_invalid_files_count_as_failed() {
        let dir = project(&[
            ("src/A.php", MARKED),
            ("src/C.php", "<?php
class C {
    public function f( {
"),
        ]);
        fs::write(dir.path().join("src/B.php"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let scanner = scanner(dir.path(), ScannerConfig::default());
        assert_eq!(scanner.scan_all().count(), 1);
        assert_eq!(
            scanner.last_scan_stats(),
            ScanStats {
                scanned: 3,
                skipped: 0,
                failed: 2
            }
        );
    }

    #[test]
    fn rooted_exclusion_is_relative_to_the_base() {
        let dir = project(&[("src/A.php", MARKED), ("src/Legacy/B.php", MARKED)]);
        let config = ScannerConfig {
            exclude_paths: vec!["/src/Legacy/**".into()],
            ..ScannerConfig::default()
        };
        let records: Vec<_> = scanner(dir.path(), config).scan_all().collect();
        assert_eq!(files(&records), vec![dir.path().join("src/A.php")]);
    }
}
