//! `attrix validate`: check discovered records against their source files.

use attrix_registry::{validate, ValidationResult};

use crate::project::load_project;
use crate::GlobalArgs;

/// Runs the `attrix validate` command. Returns 1 when any record is stale.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mut registry = project.registry();
    let attributes = registry.discover();
    let result = validate(attributes.as_slice());
    print!("{}", render(&result));
    Ok(if result.valid { 0 } else { 1 })
}

fn render(result: &ValidationResult) -> String {
    let mut out = format!(
        "{} attribute(s) in {} file(s)\n",
        result.total_attributes, result.total_files
    );
    if result.valid {
        out.push_str("Cache is valid\n");
    } else {
        for error in &result.errors {
            out.push_str("  ");
            out.push_str(error);
            out.push('\n');
        }
        out.push_str(&format!("Cache is stale: {} error(s)\n", result.errors.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_valid_and_stale() {
        let valid = ValidationResult {
            valid: true,
            errors: Vec::new(),
            total_attributes: 2,
            total_files: 1,
        };
        assert_eq!(render(&valid), "2 attribute(s) in 1 file(s)\nCache is valid\n");

        let stale = ValidationResult {
            valid: false,
            errors: vec!["File not found: /app/src/A.php".into()],
            total_attributes: 1,
            total_files: 1,
        };
        assert_eq!(
            render(&stale),
            "1 attribute(s) in 1 file(s)\n  File not found: /app/src/A.php\nCache is stale: 1 error(s)\n"
        );
    }
}
