//! Augury CLI — authoring, publishing and compute commands.
//!
//! Commands:
//! - `validate` — normalize (or lock-check) a definition and print the report
//! - `normalize` — print the canonical form of an authored definition
//! - `publish` — validate and add a definition to the catalog
//! - `compute` — compute one identity against a published definition
//! - `batch` — compute a CSV of identities into a flat CSV of items
//! - `catalog list` — list published slugs and their hashes
//! - `demo` — print a synthetic canonical definition
//!
//! Logs go to stderr (`RUST_LOG`, default `augury=info`); stdout carries only
//! JSON or CSV.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use augury_core::demo::demo_definition;
use augury_core::identity::IdentityInput;
use augury_core::locked::validate_locked;
use augury_core::normalize::normalize_json;
use augury_core::validate::{validate_all, ValidationReport};
use augury_runner::{run_batch, AppConfig, Catalog, CatalogError, ComputeRequest, ComputeService};

#[derive(Parser)]
#[command(
    name = "augury",
    about = "Augury CLI — deterministic content resolution"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog directory. Overrides `catalog_dir` from the config.
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an authored definition and print the error contract.
    Validate {
        /// Definition JSON file.
        file: PathBuf,

        /// Use the locked schema (no coercion, every violation reported).
        #[arg(long, default_value_t = false)]
        locked: bool,

        /// Print every structural error instead of the first.
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Print the canonical form of an authored definition.
    Normalize {
        /// Definition JSON file.
        file: PathBuf,
    },
    /// Validate a definition and publish it to the catalog.
    Publish {
        /// Definition JSON file.
        file: PathBuf,

        /// Use the locked schema instead of normalization.
        #[arg(long, default_value_t = false)]
        locked: bool,
    },
    /// Compute one identity against a published definition.
    Compute {
        /// Published slug.
        #[arg(long)]
        slug: String,

        /// Subject (product) key.
        #[arg(long)]
        subject: String,

        /// Birth date (YYYY-MM-DD).
        #[arg(long)]
        birth_date: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        locale: Option<String>,

        /// Return the full result instead of the teaser.
        #[arg(long, default_value_t = false)]
        paid: bool,
    },
    /// Compute every identity in a CSV (subject,birth_date,name,locale).
    Batch {
        /// Published slug.
        #[arg(long)]
        slug: String,

        /// Input CSV.
        #[arg(long)]
        input: PathBuf,

        /// Output CSV.
        #[arg(long)]
        output: PathBuf,
    },
    /// Catalog inspection.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Print a synthetic canonical definition.
    Demo {
        #[arg(long, default_value = "demo-edition")]
        slug: String,

        /// Tasks per category.
        #[arg(long, default_value_t = 30)]
        pool_size: usize,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List published slugs and content hashes.
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("augury=info".parse()?)
                .add_directive("augury_runner=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.catalog_dir {
        config.catalog_dir = dir;
    }

    match cli.command {
        Commands::Validate { file, locked, all } => run_validate(&file, locked, all, &config),
        Commands::Normalize { file } => run_normalize(&file),
        Commands::Publish { file, locked } => run_publish(&file, locked, &config),
        Commands::Compute {
            slug,
            subject,
            birth_date,
            name,
            locale,
            paid,
        } => run_compute(
            ComputeRequest {
                slug,
                identity: IdentityInput {
                    subject,
                    birth_date,
                    name,
                    locale,
                },
                paid,
            },
            &config,
        ),
        Commands::Batch {
            slug,
            input,
            output,
        } => run_batch_cmd(&slug, &input, &output, &config),
        Commands::Catalog { action } => match action {
            CatalogAction::List => run_catalog_list(&config),
        },
        Commands::Demo { slug, pool_size } => print_json(&demo_definition(&slug, pool_size)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn open_catalog(config: &AppConfig) -> Result<Catalog> {
    Ok(Catalog::open(&config.catalog_dir, config.engine.clone())?)
}

fn run_validate(file: &Path, locked: bool, all: bool, config: &AppConfig) -> Result<()> {
    let content = read_file(file)?;

    if locked {
        let value: serde_json::Value = serde_json::from_str(&content)?;
        match validate_locked(&value, &config.engine) {
            Ok(_) => print_json(&ValidationReport::from_errors(&[])),
            Err(err) => {
                print_json(&err)?;
                std::process::exit(1);
            }
        }
    } else {
        let definition = normalize_json(&content)?;
        let errors = validate_all(&definition, &config.engine);
        if all {
            print_json(&errors)?;
        } else {
            print_json(&ValidationReport::from_errors(&errors))?;
        }
        if !errors.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn run_normalize(file: &Path) -> Result<()> {
    let definition = normalize_json(&read_file(file)?)?;
    print_json(&definition)
}

fn run_publish(file: &Path, locked: bool, config: &AppConfig) -> Result<()> {
    let content = read_file(file)?;
    let mut catalog = open_catalog(config)?;

    let outcome = if locked {
        let value: serde_json::Value = serde_json::from_str(&content)?;
        catalog.publish_locked(&value)
    } else {
        catalog.publish(&content)
    };

    match outcome {
        Ok(published) => print_json(&published),
        Err(CatalogError::Invalid { errors, .. }) => {
            print_json(&ValidationReport::from_errors(&errors))?;
            std::process::exit(1);
        }
        Err(CatalogError::Locked(err)) => {
            print_json(&err)?;
            std::process::exit(1);
        }
        Err(other) => Err(other.into()),
    }
}

fn run_compute(request: ComputeRequest, config: &AppConfig) -> Result<()> {
    let catalog = open_catalog(config)?;
    let service = ComputeService::new(&catalog);
    match service.handle(&request) {
        Ok(response) => print_json(&response),
        Err(err) => {
            print_json(&err.to_response())?;
            std::process::exit(1);
        }
    }
}

fn run_batch_cmd(slug: &str, input: &Path, output: &Path, config: &AppConfig) -> Result<()> {
    let catalog = open_catalog(config)?;
    let Ok(definition) = catalog.get(slug) else {
        bail!("no published definition for '{slug}'");
    };
    let summary = run_batch(input, output, definition, catalog.config())?;
    info!(
        identities = summary.identities,
        items = summary.items,
        "wrote {}",
        output.display()
    );
    print_json(&summary)
}

fn run_catalog_list(config: &AppConfig) -> Result<()> {
    let catalog = open_catalog(config)?;
    for (slug, hash) in catalog.registry().iter() {
        println!("{slug}\t{hash}");
    }
    Ok(())
}
