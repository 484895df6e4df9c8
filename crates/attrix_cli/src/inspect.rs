//! `attrix inspect`: full detail of matching attributes.

use std::fmt::Write;
use std::path::Path;

use attrix_registry::AttributeCollection;

use crate::list::location;
use crate::project::load_project;
use crate::GlobalArgs;

/// Runs the `attrix inspect` command.
///
/// Matches `name` against attribute types first and falls back to owning
/// classes. Returns 1 when nothing matches.
pub fn run(name: &str, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mut registry = project.registry();

    let mut matches = registry.find_by_attribute(name);
    if matches.is_empty() {
        matches = registry.find_by_class(name);
    }
    if matches.is_empty() {
        eprintln!("error: no attribute or class matching '{name}'");
        return Ok(1);
    }
    print!("{}", render_detail(&matches, &project.root));
    Ok(0)
}

/// A block per record with its arguments, one per line.
pub fn render_detail(attributes: &AttributeCollection, root: &Path) -> String {
    let mut out = String::new();
    for (i, record) in attributes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", record.attribute_type);
        let _ = writeln!(out, "  owner:    {}", record.owner_type);
        let _ = writeln!(out, "  target:   {}", record.target);
        let _ = writeln!(
            out,
            "  location: {}",
            location(&record.source_file, record.line_number, root)
        );
        if let Some(plugin) = &record.owning_plugin_name {
            let _ = writeln!(out, "  plugin:   {plugin}");
        }
        if record.arguments.is_empty() {
            let _ = writeln!(out, "  arguments: none");
        } else {
            let _ = writeln!(out, "  arguments:");
            for (key, value) in record.arguments.iter() {
                let _ = writeln!(out, "    {key}: {value}");
            }
        }
    }
    out
}
