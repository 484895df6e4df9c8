//! Expansion of glob patterns against base directories.
//!
//! Patterns containing `**` walk the directory tree below the part before the
//! `**`; other patterns expand one glob level per path segment and their
//! wildcards never cross a `/`. Results are produced lazily and nothing is
//! cached, so every call re-reads the file system.

use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Upper bound on the directory depth of a recursive walk.
pub const MAX_WALK_DEPTH: usize = 64;

/// Expands every pattern against every base path.
///
/// Base paths are visited in the given order, and for each base the patterns
/// in the given order. A file matched by several patterns or reachable from
/// several bases is yielded once per match.
pub fn resolve_all<'a, P: AsRef<Path>>(
    base_paths: &'a [P],
    patterns: &'a [String],
) -> impl Iterator<Item = PathBuf> + 'a {
    base_paths
        .iter()
        .flat_map(move |base| resolve_under(base.as_ref(), patterns))
}

/// Expands every pattern against a single base path.
pub fn resolve_under<'a>(
    base: &'a Path,
    patterns: &'a [String],
) -> impl Iterator<Item = PathBuf> + 'a {
    patterns.iter().flat_map(move |pattern| expand(base, pattern))
}

/// Expands one pattern anchored under `base`.
///
/// An invalid pattern is logged and yields nothing.
pub fn expand(base: &Path, pattern: &str) -> Box<dyn Iterator<Item = PathBuf>> {
    let pattern = pattern.trim().trim_start_matches('/');
    if pattern.is_empty() {
        return Box::new(std::iter::empty());
    }
    match pattern.find("**") {
        Some(idx) => expand_recursive(base, &pattern[..idx], &pattern[idx + 2..]),
        None => expand_single_level(base, pattern),
    }
}

fn anchor(base: &Path, dir: &str) -> PathBuf {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        base.to_path_buf()
    } else {
        base.join(dir)
    }
}

fn expand_recursive(base: &Path, prefix: &str, suffix: &str) -> Box<dyn Iterator<Item = PathBuf>> {
    let root = anchor(base, prefix);
    if !root.is_dir() {
        debug!(root = %root.display(), "recursive pattern prefix is not a directory");
        return Box::new(std::iter::empty());
    }
    let matcher = match SuffixMatcher::new(suffix) {
        Ok(matcher) => matcher,
        Err(err) => {
            warn!(pattern = %format!("{prefix}**{suffix}"), error = %err, "invalid glob pattern");
            return Box::new(std::iter::empty());
        }
    };
    Box::new(
        files_below(&root, MAX_WALK_DEPTH)
            .filter(move |path| matcher.matches(&root, path)),
    )
}

fn expand_single_level(base: &Path, pattern: &str) -> Box<dyn Iterator<Item = PathBuf>> {
    let Some(first_wild) = pattern.find(['*', '?', '[', '{']) else {
        let path = base.join(pattern);
        return if path.is_file() {
            Box::new(std::iter::once(path))
        } else {
            Box::new(std::iter::empty())
        };
    };
    let split = pattern[..first_wild].rfind('/').map_or(0, |i| i + 1);
    let (dir, rest) = pattern.split_at(split);
    let root = anchor(base, dir);
    if !root.is_dir() {
        return Box::new(std::iter::empty());
    }
    let matcher = match glob(rest) {
        Ok(matcher) => matcher,
        Err(err) => {
            warn!(pattern, error = %err, "invalid glob pattern");
            return Box::new(std::iter::empty());
        }
    };
    // An alternation can contain separators, so this bounds every branch.
    let depth = rest.matches('/').count() + 1;
    Box::new(files_below(&root, depth).filter(move |path| {
        path.strip_prefix(&root)
            .is_ok_and(|relative| matcher.is_match(relative))
    }))
}

/// How the part after `**` selects files.
enum SuffixMatcher {
    /// Empty suffix: every file.
    All,
    /// Suffix without `/`: matched against the file name.
    Name(GlobMatcher),
    /// Suffix with `/`: matched against the trailing segments of the path
    /// relative to the walk root.
    Relative(GlobMatcher),
}

impl SuffixMatcher {
    fn new(suffix: &str) -> Result<Self, globset::Error> {
        // `src/**.php` glues the wildcard to the suffix: any name ending in `.php`.
        let (glued, suffix) = match suffix.strip_prefix('/') {
            Some(rest) => (false, rest),
            None => (true, suffix),
        };
        if suffix.is_empty() {
            return Ok(SuffixMatcher::All);
        }
        let pattern = if glued {
            format!("*{suffix}")
        } else {
            suffix.to_string()
        };
        if pattern.contains('/') {
            Ok(SuffixMatcher::Relative(glob(&format!("**/{pattern}"))?))
        } else {
            Ok(SuffixMatcher::Name(glob(&pattern)?))
        }
    }

    fn matches(&self, root: &Path, path: &Path) -> bool {
        match self {
            SuffixMatcher::All => true,
            SuffixMatcher::Name(matcher) => path
                .file_name()
                .is_some_and(|name| matcher.is_match(name)),
            SuffixMatcher::Relative(matcher) => path
                .strip_prefix(root)
                .is_ok_and(|relative| matcher.is_match(relative)),
        }
    }
}

fn glob(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Regular files below `root`, depth first, directory entries sorted by name.
///
/// Symbolic links are followed. Loops and unreadable entries are logged and
/// skipped.
fn files_below(root: &Path, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                if err.loop_ancestor().is_some() {
                    warn!(path = %path, "skipping symbolic link cycle");
                } else {
                    warn!(path = %path, error = %err, "skipping unreadable directory entry");
                }
                None
            }
        })
        .filter(|entry: &DirEntry| entry.file_type().is_file())
        .map(DirEntry::into_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<?php\n").unwrap();
        }
        dir
    }

    fn relative(base: &Path, paths: impl Iterator<Item = PathBuf>) -> Vec<String> {
        paths
            .map(|p| p.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn recursive_pattern_walks_sorted_depth_first() {
        let dir = tree(&[
            "src/b.php",
            "src/a.php",
            "src/Controller/Home.php",
            "src/Controller/notes.txt",
            "src/Model/User.php",
        ]);
        let found = relative(dir.path(), expand(dir.path(), "src/**/*.php"));
        assert_eq!(
            found,
            vec![
                "src/Controller/Home.php",
                "src/Model/User.php",
                "src/a.php",
                "src/b.php",
            ]
        );
    }

    #[test]
    fn recursive_pattern_with_missing_prefix_yields_nothing() {
        let dir = tree(&["src/a.php"]);
        assert_eq!(expand(dir.path(), "lib/**/*.php").count(), 0);
    }

    #[test]
    fn empty_suffix_matches_every_file() {
        let dir = tree(&["src/a.php", "src/x/readme.md"]);
        let found = relative(dir.path(), expand(dir.path(), "src/**"));
        assert_eq!(found, vec!["src/a.php", "src/x/readme.md"]);
    }

    #[test]
    fn glued_suffix_matches_name_ending() {
        let dir = tree(&["src/a.php", "src/x/b.php", "src/x/c.inc"]);
        let found = relative(dir.path(), expand(dir.path(), "src/**.php"));
        assert_eq!(found, vec!["src/a.php", "src/x/b.php"]);
    }

    #[test]
    fn suffix_with_separator_matches_relative_path() {
        let dir = tree(&[
            "src/Controller/Home.php",
            "src/Admin/Controller/Users.php",
            "src/Admin/Users.php",
        ]);
        let found = relative(dir.path(), expand(dir.path(), "src/**/Controller/*.php"));
        assert_eq!(
            found,
            vec!["src/Admin/Controller/Users.php", "src/Controller/Home.php"]
        );
    }

    #[test]
    fn single_level_wildcards_do_not_cross_separators() {
        let dir = tree(&["src/a.php", "src/sub/b.php"]);
        let found = relative(dir.path(), expand(dir.path(), "src/*.php"));
        assert_eq!(found, vec!["src/a.php"]);
    }

    #[test]
    fn brace_alternation_and_classes() {
        let dir = tree(&["src/a.php", "lib/b.php", "lib/c.inc", "tests/t1.php", "tests/tx.php"]);
        let found = relative(dir.path(), expand(dir.path(), "{src,lib}/*.php"));
        assert_eq!(found, vec!["lib/b.php", "src/a.php"]);
        let found = relative(dir.path(), expand(dir.path(), "tests/t[0-9].php"));
        assert_eq!(found, vec!["tests/t1.php"]);
        let found = relative(dir.path(), expand(dir.path(), "tests/t?.php"));
        assert_eq!(found, vec!["tests/t1.php", "tests/tx.php"]);
    }

    #[test]
    fn literal_pattern_yields_existing_file_only() {
        let dir = tree(&["src/a.php"]);
        assert_eq!(expand(dir.path(), "src/a.php").count(), 1);
        assert_eq!(expand(dir.path(), "src/missing.php").count(), 0);
        assert_eq!(expand(dir.path(), "src").count(), 0);
    }

    #[test]
    fn invalid_pattern_yields_nothing() {
        let dir = tree(&["src/a.php"]);
        assert_eq!(expand(dir.path(), "src/[a.php").count(), 0);
    }

    #[test]
    fn bases_in_order_without_dedup() {
        let app = tree(&["src/a.php"]);
        let plugin = tree(&["src/p.php"]);
        let bases = [app.path().to_path_buf(), plugin.path().to_path_buf()];
        let patterns = vec!["src/**/*.php".to_string(), "src/*.php".to_string()];
        let found: Vec<PathBuf> = resolve_all(&bases, &patterns).collect();
        assert_eq!(found.len(), 4);
        assert!(found[0].starts_with(app.path()));
        assert!(found[1].starts_with(app.path()));
        assert!(found[2].starts_with(plugin.path()));
    }

    #[test]
    fn restartable() {
        let dir = tree(&["src/a.php"]);
        let bases = [dir.path().to_path_buf()];
        let patterns = vec!["src/**/*.php".to_string()];
        assert_eq!(resolve_all(&bases, &patterns).count(), 1);
        fs::write(dir.path().join("src/b.php"), "<?php\n").unwrap();
        assert_eq!(resolve_all(&bases, &patterns).count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_skipped() {
        let dir = tree(&["src/a.php"]);
        std::os::unix::fs::symlink(dir.path().join("src"), dir.path().join("src/loop")).unwrap();
        let found = relative(dir.path(), expand(dir.path(), "src/**/*.php"));
        assert_eq!(found, vec!["src/a.php"]);
    }
}
