use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use host::{BuildOptions, FsBuild, Plugin};
use regex::Regex;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use type_schema::{JsonTypeSchema, TypeSchema, TypeSchemaOptions};

fn main() {
    let matches = Command::new("type-schema")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts decorator metadata from a TypeScript build into a JSON type schema")
        .arg(
            Arg::new("entry")
                .value_name("ENTRY")
                .num_args(1..)
                .required(true)
                .help("Entry points of the build"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .value_name("PATH")
                .required(true)
                .help("Where the bundled sources are written"),
        )
        .arg(
            Arg::new("schema")
                .short('s')
                .long("schema")
                .value_name("PATH")
                .required(true)
                .help("Where the JSON type schema is written"),
        )
        .arg(
            Arg::new("tsconfig")
                .short('p')
                .long("tsconfig")
                .value_name("PATH")
                .help("Path to tsconfig.json (defaults to the working directory)"),
        )
        .arg(
            Arg::new("dec-filter")
                .long("dec-filter")
                .value_name("REGEX")
                .help("Pattern matching declaration file paths (default: \\.dec)"),
        )
        .arg(
            Arg::new("strip")
                .long("strip")
                .action(ArgAction::SetTrue)
                .help("Remove recognized decorators from the bundled sources"),
        )
        .arg(
            Arg::new("cwd")
                .long("cwd")
                .value_name("DIR")
                .help("Working directory of the build"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log every file and class"),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            tracing::error!("{:#}", err);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

fn working_dir(matches: &ArgMatches) -> Result<PathBuf> {
    let dir = match matches.get_one::<String>("cwd") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Cannot determine the working directory")?,
    };
    std::fs::canonicalize(&dir).with_context(|| format!("Cannot access {}", dir.display()))
}

/// Runs the build; `Ok(false)` when it finished with errors.
fn run(matches: &ArgMatches) -> Result<bool> {
    let options = BuildOptions {
        entry_points: matches
            .get_many::<String>("entry")
            .into_iter()
            .flatten()
            .map(PathBuf::from)
            .collect(),
        outfile: matches.get_one::<String>("outfile").map(PathBuf::from),
        bundle: true,
        write: true,
        tsconfig: matches.get_one::<String>("tsconfig").map(PathBuf::from),
        abs_working_dir: Some(working_dir(matches)?),
    };

    let schema_path = matches
        .get_one::<String>("schema")
        .map(PathBuf::from)
        .context("--schema is required")?;
    let mut schema_options = TypeSchemaOptions::new(JsonTypeSchema::new(schema_path))
        .strip_decorators(matches.get_flag("strip"));
    if let Some(filter) = matches.get_one::<String>("dec-filter") {
        let filter = Regex::new(filter)
            .with_context(|| format!("Invalid declaration file filter '{}'", filter))?;
        schema_options = schema_options.declaration_file_filter(filter);
    }

    let plugin: Arc<dyn Plugin> = Arc::new(TypeSchema::new(schema_options));
    let result = FsBuild::run(options, &[plugin])?;

    for warning in &result.warnings {
        tracing::warn!("{}", warning);
    }
    if !result.is_success() {
        tracing::error!("Build failed with {} error(s)", result.errors.len());
        return Ok(false);
    }
    Ok(true)
}
