//! `attrix clear`: drop every cached attribute set.

use crate::project::load_project;
use crate::GlobalArgs;

/// Runs the `attrix clear` command. Returns 1 if the cache could not be cleared.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mut registry = project.registry();
    if registry.clear_cache() {
        if !global.quiet {
            println!("Attribute cache cleared");
        }
        Ok(0)
    } else {
        eprintln!("error: failed to clear the attribute cache");
        Ok(1)
    }
}
