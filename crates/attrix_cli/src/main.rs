//! Attrix CLI: inspect and maintain the attribute cache of a PHP project.
//!
//! Provides `attrix discover` to rebuild the cache, `attrix list` and
//! `attrix inspect` to query discovered attributes, `attrix validate` to check
//! cached records against their files, and `attrix clear` to drop the cache.

#![warn(missing_docs)]

mod clear;
mod discover;
mod inspect;
mod list;
mod project;
mod validate;

use std::process;

use attrix_common::TargetKind;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ATTRIX_LOG";

/// Attrix: PHP attribute discovery and caching.
#[derive(Parser, Debug)]
#[command(name = "attrix", version, about = "PHP attribute discovery")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to an `attrix.toml` file or the project directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clear the cache and discover all attributes again.
    Discover,
    /// List discovered attributes.
    List(ListArgs),
    /// Show every attribute of a type or class in detail.
    Inspect {
        /// Attribute type or class name (substring match).
        name: String,
    },
    /// Check discovered records against their source files.
    Validate,
    /// Clear the attribute cache.
    Clear,
}

/// Arguments for the `attrix list` subcommand.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only attributes whose type contains this text.
    #[arg(long)]
    pub attribute: Option<String>,

    /// Only attributes whose owning class contains this text.
    #[arg(long)]
    pub class: Option<String>,

    /// Only attributes on this kind of target.
    #[arg(long, value_parser = parse_target_kind)]
    pub target: Option<TargetKind>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Listing output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable table.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print debug information.
    pub verbose: bool,
    /// Optional path to a config file or project directory.
    pub config: Option<String>,
}

fn parse_target_kind(s: &str) -> Result<TargetKind, String> {
    s.parse::<TargetKind>().map_err(|e| e.to_string())
}

/// Installs the log subscriber. `ATTRIX_LOG` wins over the verbosity flags.
fn init_logging(global: &GlobalArgs) {
    let default_level = if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Discover => discover::run(&global),
        Command::List(ref args) => list::run(args, &global),
        Command::Inspect { ref name } => inspect::run(name, &global),
        Command::Validate => validate::run(&global),
        Command::Clear => clear::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_discover() {
        let cli = Cli::parse_from(["attrix", "discover"]);
        assert!(matches!(cli.command, Command::Discover));
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_list_default() {
        let cli = Cli::parse_from(["attrix", "list"]);
        match cli.command {
            Command::List(ref args) => {
                assert!(args.attribute.is_none());
                assert!(args.class.is_none());
                assert!(args.target.is_none());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn parse_list_with_filters() {
        let cli = Cli::parse_from([
            "attrix",
            "list",
            "--attribute",
            "Route",
            "--class",
            "Users",
            "--target",
            "method",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::List(ref args) => {
                assert_eq!(args.attribute.as_deref(), Some("Route"));
                assert_eq!(args.class.as_deref(), Some("Users"));
                assert_eq!(args.target, Some(TargetKind::Method));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected List command"),
        }
    }

    #[test]
    fn parse_list_rejects_unknown_target() {
        assert!(Cli::try_parse_from(["attrix", "list", "--target", "function"]).is_err());
    }

    #[test]
    fn parse_inspect_requires_name() {
        assert!(Cli::try_parse_from(["attrix", "inspect"]).is_err());
        let cli = Cli::parse_from(["attrix", "inspect", "Route"]);
        match cli.command {
            Command::Inspect { name } => assert_eq!(name, "Route"),
            _ => panic!("expected Inspect command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["attrix", "--quiet", "--config", "/app/attrix.toml", "clear"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("/app/attrix.toml"));
        assert!(matches!(cli.command, Command::Clear));

        let cli = Cli::parse_from(["attrix", "validate", "-v"]);
        assert!(cli.verbose);
    }
}
