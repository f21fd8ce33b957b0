//! Validator Schema CLI
//!
//! Command-line interface for applying validator rules to OpenAPI documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use validator_schema::{
    apply_to_document, default_rules, load_document_auto, load_options, load_validators,
    RuleEngine, SchemaGenerationOptions, Services, ValidationRulesFilter,
};

#[derive(Parser)]
#[command(name = "validator-schema")]
#[command(about = "Apply validator rules to OpenAPI schema constraints")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply validator definitions to a document's schemas
    Apply {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Validator definitions: file path or URL
        #[arg(long)]
        validators: String,

        /// JSON file with generation options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fall back to ancestor type validators
        #[arg(long)]
        search_base_types: bool,

        /// Compose multiple patterns with allOf
        #[arg(long)]
        use_all_of: bool,

        /// Clear nullable when minLength/minItems is above zero
        #[arg(long)]
        not_nullable_min_length: bool,

        /// Clear nullable when minimum excludes zero
        #[arg(long)]
        not_nullable_minimum: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List built-in rule catalogue entries in application order
    Rules,
}

struct ApplyArgs {
    document: String,
    validators: String,
    config: Option<PathBuf>,
    flags: SchemaGenerationOptions,
    output: Option<PathBuf>,
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Apply {
            document,
            validators,
            config,
            search_base_types,
            use_all_of,
            not_nullable_min_length,
            not_nullable_minimum,
            output,
            pretty,
        } => run_apply(ApplyArgs {
            document,
            validators,
            config,
            flags: SchemaGenerationOptions::default()
                .search_base_types(search_base_types)
                .use_all_of(use_all_of)
                .not_nullable_if_min_length(not_nullable_min_length)
                .not_nullable_if_minimum(not_nullable_minimum),
            output,
            pretty,
        }),
        Commands::Rules => {
            run_rules();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_options(
    config: Option<&Path>,
    flags: SchemaGenerationOptions,
) -> Result<SchemaGenerationOptions, u8> {
    let base = match config {
        Some(path) => load_options(path).map_err(|e| {
            eprintln!("Error loading config: {}", e);
            e.exit_code() as u8
        })?,
        None => SchemaGenerationOptions::default(),
    };

    Ok(SchemaGenerationOptions {
        set_not_nullable_if_min_length_greater_then_zero: base
            .set_not_nullable_if_min_length_greater_then_zero
            || flags.set_not_nullable_if_min_length_greater_then_zero,
        set_not_nullable_if_minimum_greater_then_zero: base
            .set_not_nullable_if_minimum_greater_then_zero
            || flags.set_not_nullable_if_minimum_greater_then_zero,
        use_all_of_for_multiple_rules: base.use_all_of_for_multiple_rules
            || flags.use_all_of_for_multiple_rules,
        search_base_type_validators: base.search_base_type_validators
            || flags.search_base_type_validators,
    })
}

fn run_apply(args: ApplyArgs) -> Result<(), u8> {
    let options = resolve_options(args.config.as_deref(), args.flags)?;

    let registry = load_validators(&args.validators).map_err(|e| {
        eprintln!("Error loading validators: {}", e);
        e.exit_code() as u8
    })?;

    let mut document = load_document_auto(&args.document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let services = Services::new(options).with_engine(Arc::new(RuleEngine::new(options)));
    let filter = ValidationRulesFilter::from_services(&services);
    let changed = apply_to_document(&mut document, &filter, &registry).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    info!(changed, "schemas updated");

    let json_output = if args.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_rules() {
    for rule in default_rules() {
        println!("{}", rule.name());
    }
}
