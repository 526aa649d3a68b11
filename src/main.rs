//! Command-line front end for the projection and query-assist helpers.
//!
//! Runs each helper against a domain registry document, printing JSON on
//! stdout and status lines on stderr.
//!
//! # Usage
//!
//! ```bash
//! # Check a where clause against the allow-list of `invoices`
//! orm-bridge --domain domain.json filters invoices '{"number": {"$gt": 10}}'
//!
//! # Parse a sort parameter
//! orm-bridge sort 'name,-age'
//!
//! # Project a record (or an array of records) of `invoices`
//! orm-bridge --domain domain.json project invoices invoice.json --fields number,people
//!
//! # Deep-merge configuration documents
//! orm-bridge merge base.json local.json
//! ```
//!
//! # Environment Variables
//!
//! - `DOMAIN_FILE` - registry document used when `--domain` is omitted
//! - `RUST_LOG` - log filter (default: `warn`)
//! - `LOG_FORMAT` - `text` or `json` (default: `text`)
//! - bookkeeping overrides, see [`orm_bridge::config`]

use orm_bridge::api::ParsedRequest;
use orm_bridge::application::{extract_sort_arg, object_to_dict, validate_filters};
use orm_bridge::config::{load_registry, read_json};
use orm_bridge::domain::mapped::Record;
use orm_bridge::domain::registry::DomainRegistry;
use orm_bridge::utils::dict_update_value;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Projection, filter and sort helpers for REST resources backed by an ORM.
#[derive(Parser)]
#[command(name = "orm-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Domain registry document (JSON)
    #[arg(short, long, global = true)]
    domain: Option<PathBuf>,

    /// Documents deep-merged over the registry, in order
    #[arg(short = 'o', long = "override", global = true)]
    overrides: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a `where` document against a resource's allowed filters
    Filters {
        /// Resource name
        resource: String,

        /// JSON `where` document
        #[arg(value_name = "WHERE")]
        where_clause: String,
    },

    /// Parse a `sort` parameter
    Sort {
        /// Raw sort value, e.g. `name,-age`
        sort: String,
    },

    /// Project a JSON record (or array of records) of a resource
    Project {
        /// Resource name
        resource: String,

        /// Record document
        record: PathBuf,

        /// Fields to project (defaults to every schema field)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Deep-merge JSON documents left to right
    Merge {
        /// Base document
        base: PathBuf,

        /// Documents merged over the base
        #[arg(required = true)]
        updates: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Filters {
            ref resource,
            ref where_clause,
        } => handle_filters(&load(&cli)?, resource, where_clause),
        Commands::Sort { ref sort } => handle_sort(sort),
        Commands::Project {
            ref resource,
            ref record,
            ref fields,
        } => handle_project(&load(&cli)?, resource, record, fields),
        Commands::Merge {
            ref base,
            ref updates,
        } => handle_merge(base, updates),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        Ok("text") | Err(_) => builder.init(),
        Ok(other) => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{other}'"),
    }

    Ok(())
}

/// Loads the registry from `--domain` or `DOMAIN_FILE`.
fn load(cli: &Cli) -> Result<DomainRegistry> {
    let path = match &cli.domain {
        Some(path) => path.clone(),
        None => std::env::var("DOMAIN_FILE")
            .map(PathBuf::from)
            .context("--domain or DOMAIN_FILE must be set")?,
    };

    let registry = load_registry(&path, &cli.overrides)?;
    registry.settings().print_summary();
    Ok(registry)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_filters(registry: &DomainRegistry, resource: &str, where_clause: &str) -> Result<()> {
    let request = ParsedRequest::default().with_where(where_clause);
    let clauses = request.filter_clauses()?;

    if let Some(message) = validate_filters(registry, &clauses, resource)? {
        eprintln!("{} {}", "✗".red().bold(), message.red());
        anyhow::bail!(message);
    }

    eprintln!(
        "{} {} filter(s) allowed on {}",
        "✓".green().bold(),
        clauses.len(),
        resource.cyan()
    );
    print_json(&serde_json::to_value(&clauses)?)
}

fn handle_sort(sort: &str) -> Result<()> {
    let parsed = extract_sort_arg(sort)?;
    match parsed {
        Some(arg) => print_json(&arg.to_value()),
        None => {
            eprintln!("{}", "No sort requested".yellow());
            print_json(&Value::Null)
        }
    }
}

fn handle_project(
    registry: &DomainRegistry,
    resource: &str,
    record: &Path,
    fields: &[String],
) -> Result<()> {
    let fields = if fields.is_empty() {
        ParsedRequest::default().projected_fields(registry, resource)?
    } else {
        fields.to_vec()
    };

    let project = |document: &Value| -> Result<Value> {
        let record = Record::from_json(registry, resource, document)?;
        Ok(Value::Object(object_to_dict(registry, &record, &fields, resource)))
    };

    let output = match read_json(record)? {
        Value::Array(documents) => Value::Array(
            documents
                .iter()
                .map(project)
                .collect::<Result<Vec<_>>>()?,
        ),
        document => project(&document)?,
    };

    print_json(&output)
}

fn handle_merge(base: &Path, updates: &[PathBuf]) -> Result<()> {
    let mut merged = read_json(base)?;
    for update in updates {
        dict_update_value(&mut merged, &read_json(update)?);
    }

    eprintln!(
        "{} merged {} document(s) into {}",
        "✓".green().bold(),
        updates.len(),
        base.display().to_string().cyan()
    );
    print_json(&merged)
}
