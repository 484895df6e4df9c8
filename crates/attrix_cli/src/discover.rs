//! `attrix discover`: rebuild the attribute cache from scratch.

use std::time::Instant;

use crate::project::load_project;
use crate::GlobalArgs;

/// Runs the `attrix discover` command.
///
/// Clears the cache, scans the project and stores the result. Returns exit
/// code 0, or 1 when some files failed to scan.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mut registry = project.registry();

    if !global.quiet {
        eprintln!("  Discovering attributes in {}", project.root.display());
    }
    let start = Instant::now();
    let report = registry.warm_cache();
    let elapsed = start.elapsed();

    if !global.quiet {
        if !report.cleared {
            eprintln!("warning: the previous cache could not be fully cleared");
        }
        if !registry.is_cache_enabled() {
            eprintln!("warning: caching is disabled; results were not stored");
        }
    }
    println!(
        "Discovered {} attribute(s) in {:.2}s",
        report.attributes,
        elapsed.as_secs_f64()
    );
    if report.failed_files > 0 {
        eprintln!("error: {} file(s) could not be scanned", report.failed_files);
        return Ok(1);
    }
    Ok(0)
}
