//! # kyc CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kyc_cli::fixture::{load_registry, load_schemas};
use kyc_cli::map::{run_map, MapArgs};
use kyc_cli::rules::{run_rules, RulesArgs};
use kyc_cli::status::{run_status, StatusArgs};
use kyc_cli::translate::{run_translate, TranslateArgs};

/// Onboarding engine CLI.
///
/// Evaluates field rules, maps client fixtures to form values, computes
/// section status and translates server validation errors.
#[derive(Parser, Debug)]
#[command(name = "kyc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Field registry YAML to use instead of the built-in one.
    #[arg(long = "fields", value_name = "PATH", global = true)]
    fields_file: Option<PathBuf>,

    /// Directory of `*.schema.json` files to use instead of the built-in set.
    #[arg(long, global = true)]
    schemas: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print effective field rules for a context.
    Rules(RulesArgs),

    /// Print the form values of one party of a client.
    Map(MapArgs),

    /// Print section statuses of the default onboarding flow.
    Status(StatusArgs),

    /// Attach server validation errors to form fields.
    Translate(TranslateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let registry = load_registry(cli.fields_file.as_deref())?;
    tracing::debug!(fields = registry.len(), "field registry loaded");

    match cli.command {
        Commands::Rules(args) => run_rules(&args, &registry),
        Commands::Map(args) => run_map(&args, &registry),
        Commands::Status(args) => {
            let schemas = load_schemas(cli.schemas.as_deref())?;
            run_status(&args, &registry, &schemas)
        }
        Commands::Translate(args) => run_translate(&args, &registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_rules_with_fields() {
        let cli = Cli::try_parse_from([
            "kyc",
            "rules",
            "--jurisdiction",
            "CA",
            "--product",
            "MERCHANT_SERVICES",
            "dbaName",
            "controllerIds.0.idType",
        ])
        .unwrap();
        let Commands::Rules(args) = cli.command else {
            panic!("expected rules");
        };
        assert_eq!(args.jurisdiction.as_deref(), Some("CA"));
        assert_eq!(args.fields, ["dbaName", "controllerIds.0.idType"]);
    }

    #[test]
    fn cli_parse_registry_file_next_to_field_names() {
        let cli = Cli::try_parse_from([
            "kyc",
            "--fields",
            "custom.yaml",
            "rules",
            "--jurisdiction",
            "CA",
            "dbaName",
        ])
        .unwrap();
        assert_eq!(cli.fields_file, Some(PathBuf::from("custom.yaml")));
        let Commands::Rules(args) = cli.command else {
            panic!("expected rules");
        };
        assert_eq!(args.fields, ["dbaName"]);
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kyc", "status", "client.json", "-vv", "--log-json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn cli_parse_translate_party_conflicts_with_index() {
        assert!(Cli::try_parse_from(["kyc", "translate", "e.json", "--party"]).is_ok());
        assert!(
            Cli::try_parse_from(["kyc", "translate", "e.json", "--party", "--party-index", "2"]).is_err()
        );
    }

    #[test]
    fn cli_parse_translate_array_key() {
        let cli =
            Cli::try_parse_from(["kyc", "translate", "e.json", "--array-key", "add-parties"]).unwrap();
        let Commands::Translate(args) = cli.command else {
            panic!("expected translate");
        };
        assert_eq!(args.array_key, kyc_cli::translate::ArrayKeyArg::AddParties);
    }

    #[test]
    fn cli_parse_map_requires_client() {
        assert!(Cli::try_parse_from(["kyc", "map"]).is_err());
        let cli = Cli::try_parse_from(["kyc", "map", "c.json", "--party", "p-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Map(MapArgs { party: Some(_), .. })));
    }
}
