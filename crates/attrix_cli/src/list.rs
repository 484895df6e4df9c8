//! `attrix list`: print discovered attributes.

use std::fmt::Write;
use std::path::Path;

use attrix_registry::AttributeCollection;

use crate::project::load_project;
use crate::{GlobalArgs, ListArgs, ReportFormat};

/// Runs the `attrix list` command.
pub fn run(args: &ListArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mut registry = project.registry();

    let mut attributes = registry.discover();
    if let Some(name) = &args.attribute {
        attributes = attributes.attribute_contains(name);
    }
    if let Some(name) = &args.class {
        attributes = attributes.owner_contains(name);
    }
    if let Some(kind) = args.target {
        attributes = attributes.with_target_kinds(&[kind]);
    }

    match args.format {
        ReportFormat::Text => {
            print!("{}", render_text(&attributes, &project.root));
            if !global.quiet {
                eprintln!("{} attribute(s)", attributes.len());
            }
        }
        ReportFormat::Json => println!("{}", render_json(&attributes)?),
    }
    Ok(0)
}

/// One line per record: attribute type, target and location.
pub fn render_text(attributes: &AttributeCollection, root: &Path) -> String {
    let width = attributes
        .iter()
        .map(|r| r.attribute_type.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for record in attributes {
        let _ = writeln!(
            out,
            "{:width$}  {}  {}",
            record.attribute_type,
            record.target,
            location(&record.source_file, record.line_number, root),
        );
    }
    out
}

/// The records as a pretty-printed JSON array.
pub fn render_json(attributes: &AttributeCollection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(attributes.as_slice())
}

/// `path:line` with the path relative to `root` when possible; the line is
/// omitted when unknown.
pub fn location(path: &Path, line: u32, root: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path).display();
    if line == 0 {
        shown.to_string()
    } else {
        format!("{shown}:{line}")
    }
}
