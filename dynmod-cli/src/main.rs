//! dynmod command-line inspector
//!
//! Loads schema documents the same way an embedding service would and
//! prints what the registry makes of them.
//!
//! Usage:
//!   dynmod --config dynmod.toml list
//!   dynmod --dir schemas new Manager --values '{"Name": "Ann"}'
//!   dynmod --file person.json get Person Name

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dynmod::{LoaderConfig, Model, Models, TypeRef, Value};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "dynmod")]
#[command(about = "Inspect runtime models built from JSON schemas")]
struct Args {
    /// Loader configuration file
    #[arg(short, long, default_value = "dynmod.toml")]
    config: PathBuf,

    /// Additional schema directory (repeatable)
    #[arg(short, long)]
    dir: Vec<PathBuf>,

    /// Additional schema file (repeatable)
    #[arg(short, long)]
    file: Vec<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every model with its member layout
    List,
    /// Print original schema documents
    Dump {
        /// Only this model
        model: Option<String>,
    },
    /// Produce an instance and print it as JSON
    New {
        model: String,
        /// JSON object used as the seed value
        #[arg(long)]
        values: Option<String>,
    },
    /// Produce an instance and print one field of it
    Get {
        model: String,
        path: String,
        #[arg(long)]
        values: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let models = load(&args)?;
    info!(models = models.model_names().len(), "registry ready");

    match &args.command {
        Command::List => {
            for model in models.models() {
                println!("{}: {}", model, model.composite_type());
            }
        }
        Command::Dump { model: None } => println!("{}", models.dump()),
        Command::Dump { model: Some(name) } => println!("{}", lookup(&models, name)?.dump()),
        Command::New { model, values } => {
            let model = lookup(&models, model)?;
            let instance = produce(&model, values.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&instance.to_json())?);
        }
        Command::Get { model, path, values } => {
            let model = lookup(&models, model)?;
            let mut instance = produce(&model, values.as_deref())?;
            let field = model.field(&mut instance, path);
            if !field.is_valid() {
                bail!("{} has no field {}", model, field.name());
            }
            let json: serde_json::Value = field.value()?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn load(args: &Args) -> Result<Models> {
    let mut config = LoaderConfig::load_from(&args.config);
    config.schema_dirs.extend(args.dir.iter().cloned());
    config.schema_files.extend(args.file.iter().cloned());
    debug!(
        dirs = config.schema_dirs.len(),
        files = config.schema_files.len(),
        "loading schemas"
    );

    let models = Models::new();
    models
        .load_from_config(&config)
        .context("Failed to load schemas")?;
    Ok(models)
}

fn lookup(models: &Models, name: &str) -> Result<Arc<Model>> {
    models
        .get_model(name)
        .with_context(|| format!("Unknown model {name}"))
}

fn produce(model: &Model, values: Option<&str>) -> Result<dynmod::Record> {
    let seed = match values {
        Some(raw) => {
            let json: serde_json::Value = serde_json::from_str(raw).context("Invalid --values JSON")?;
            let seed = TypeRef::Struct(model.composite_type())
                .decode_json(&json)
                .with_context(|| format!("--values does not fit {model}"))?;
            vec![seed]
        }
        None => Vec::<Value>::new(),
    };
    model
        .new_instance(&seed)
        .with_context(|| format!("Failed to produce {model}"))
}
