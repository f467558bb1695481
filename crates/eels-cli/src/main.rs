//! eels CLI: inspect, validate, and reconcile schema documents.

use clap::{Args, Parser, Subcommand};
use eels_schema::config::parse_delimiter;
use eels_schema::{
    fingerprint, merge_all, validate, widen, FieldType, Schema, SchemaCatalog, SchemaConfig,
    WidenResult,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eels")]
#[command(about = "Schema type system tooling for eels connectors", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Policy overrides. They win over the document's `config:` block, which
/// wins over `EELS_*` environment variables.
#[derive(Args, Debug, Default, Clone)]
struct ConfigArgs {
    /// Reject field names containing the reserved delimiter
    #[arg(long, global = true)]
    strict_names: bool,

    /// Allow Struct fields without children
    #[arg(long, global = true)]
    allow_empty_struct: bool,

    /// Compare field names case-insensitively
    #[arg(long, global = true)]
    case_insensitive: bool,

    /// Reserved name delimiter (single character)
    #[arg(long, global = true)]
    delimiter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a schema document (every definition, or one)
    Validate {
        /// Path to the YAML or JSON schema document
        #[arg(short, long)]
        file: PathBuf,

        /// Only check this definition
        #[arg(short, long)]
        schema: Option<String>,
    },

    /// Print the canonical text form of a definition
    Render {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        schema: String,
    },

    /// Merge the same definition from several documents (e.g. partitions)
    Merge {
        /// Definition name looked up in every document
        #[arg(short, long)]
        schema: String,

        /// Documents to merge, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emit the merged schema as a YAML document instead of text
        #[arg(long)]
        yaml: bool,
    },

    /// Print the content fingerprint of each definition
    Fingerprint {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        schema: Option<String>,
    },

    /// Show how two field types reconcile
    Widen { left: String, right: String },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate { file, schema } => {
            validate_document(&file, schema.as_deref(), &cli.config).map(|checked| {
                println!("✓ {} definition(s) valid", checked);
            })
        }
        Commands::Render { file, schema } => {
            render_definition(&file, &schema, &cli.config).map(|text| println!("{}", text))
        }
        Commands::Merge {
            schema,
            files,
            yaml,
        } => merge_documents(&files, &schema, &cli.config).and_then(|merged| {
            if yaml {
                let mut doc = SchemaCatalog::default();
                doc.insert(schema.clone(), &merged);
                print!("{}", doc.to_yaml_string()?);
            } else {
                println!("{}", merged);
            }
            Ok(())
        }),
        Commands::Fingerprint { file, schema } => {
            fingerprint_document(&file, schema.as_deref(), &cli.config).map(|rows| {
                for (name, hash) in rows {
                    println!("{}  {}", hash, name);
                }
            })
        }
        Commands::Widen { left, right } => describe_widen(&left, &right).map(|s| println!("{}", s)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_catalog(path: &Path) -> CliResult<SchemaCatalog> {
    let src = fs::read_to_string(path)?;
    let catalog = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SchemaCatalog::from_json_str(&src)?,
        _ => SchemaCatalog::from_yaml_str(&src)?,
    };
    tracing::info!(path = %path.display(), definitions = catalog.schemas.len(), "loaded schema document");
    Ok(catalog)
}

/// Environment, then the keys the document's `config:` block sets, then CLI
/// flags.
fn effective_config(catalog: &SchemaCatalog, args: &ConfigArgs) -> CliResult<SchemaConfig> {
    let mut cfg = catalog.config_over(SchemaConfig::from_env());
    apply_cli_overrides(&mut cfg, args)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut SchemaConfig, args: &ConfigArgs) -> CliResult<()> {
    if args.strict_names {
        cfg.strict_names = true;
    }
    if args.allow_empty_struct {
        cfg.allow_empty_struct = true;
    }
    if args.case_insensitive {
        cfg.case_sensitive_names = false;
    }
    if let Some(d) = &args.delimiter {
        cfg.name_delimiter = parse_delimiter(d)?;
    }
    Ok(())
}

fn resolve_checked(catalog: &SchemaCatalog, name: &str, cfg: &SchemaConfig) -> CliResult<Schema> {
    let schema = catalog.resolve(name, cfg)?;
    validate(&schema, cfg)?;
    Ok(schema)
}

fn validate_document(path: &Path, only: Option<&str>, args: &ConfigArgs) -> CliResult<usize> {
    let catalog = load_catalog(path)?;
    let cfg = effective_config(&catalog, args)?;
    match only {
        Some(name) => {
            resolve_checked(&catalog, name, &cfg)?;
            Ok(1)
        }
        None => {
            catalog.validate(&cfg)?;
            for name in catalog.names() {
                resolve_checked(&catalog, name, &cfg)?;
            }
            Ok(catalog.schemas.len())
        }
    }
}

fn render_definition(path: &Path, name: &str, args: &ConfigArgs) -> CliResult<String> {
    let catalog = load_catalog(path)?;
    let cfg = effective_config(&catalog, args)?;
    Ok(resolve_checked(&catalog, name, &cfg)?.to_string())
}

fn merge_documents(paths: &[PathBuf], name: &str, args: &ConfigArgs) -> CliResult<Schema> {
    let catalogs = paths
        .iter()
        .map(|p| load_catalog(p))
        .collect::<CliResult<Vec<_>>>()?;
    // The first document's policy governs the merge.
    let cfg = match catalogs.first() {
        Some(first) => effective_config(first, args)?,
        None => return Ok(Schema::empty()),
    };
    let parts = catalogs
        .iter()
        .map(|c| resolve_checked(c, name, &cfg))
        .collect::<CliResult<Vec<_>>>()?;
    let merged = merge_all(&parts, &cfg)?;
    tracing::debug!(parts = parts.len(), fields = merged.len(), "merged definition");
    Ok(merged)
}

fn fingerprint_document(
    path: &Path,
    only: Option<&str>,
    args: &ConfigArgs,
) -> CliResult<Vec<(String, String)>> {
    let catalog = load_catalog(path)?;
    let cfg = effective_config(&catalog, args)?;
    let names: Vec<String> = match only {
        Some(n) => vec![n.to_string()],
        None => catalog.names().map(str::to_string).collect(),
    };
    names
        .into_iter()
        .map(|name| -> CliResult<(String, String)> {
            let schema = resolve_checked(&catalog, &name, &cfg)?;
            Ok((name, fingerprint(&schema)?.to_hex()))
        })
        .collect()
}

fn describe_widen(left: &str, right: &str) -> CliResult<String> {
    let a: FieldType = left.parse()?;
    let b: FieldType = right.parse()?;
    Ok(match widen(a, b) {
        WidenResult::Equal => format!("{} = {}", a, b),
        WidenResult::WidensTo(t) => format!("{} + {} -> {}", a, b, t),
        WidenResult::Incompatible => format!("{} and {} are incompatible", a, b),
    })
}
