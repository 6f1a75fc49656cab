//! assetfs CLI - command line access to entity asset storage
//!
//! Every invocation opens the configured stores, builds the file system for
//! one entity and runs a single operation against it.

use asset_vfs::{BackendKind, EntityRef, FileSystem, VfsConfig};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "assetfs")]
#[command(about = "A versioned virtual file system for entity assets")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file (default: ~/.config/assetfs/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend to use, overriding the config file
    #[arg(short, long, global = true)]
    backend: Option<BackendKind>,

    /// Data directory, overriding the config file
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Bucket for the flat backend, overriding the config file
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Entity type owning the assets
    #[arg(short = 't', long, global = true, default_value = "exploration")]
    entity_type: String,

    /// Entity ID owning the assets
    #[arg(short = 'e', long, global = true)]
    entity_id: Option<String>,

    /// User recorded in the change log
    #[arg(short, long, global = true, default_value = "assetfs-cli")]
    user: String,

    /// Output format (json or text)
    #[arg(short, long, global = true, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a local file as an asset
    Put {
        /// Asset path within the entity's assets folder
        path: String,
        /// Local file to upload
        file: PathBuf,
        /// Content type of the asset
        #[arg(short, long)]
        mimetype: Option<String>,
    },

    /// Fetch an asset
    Get {
        /// Asset path within the entity's assets folder
        path: String,
        /// Version to fetch (latest if omitted)
        #[arg(short = 'V', long)]
        version: Option<u64>,
        /// Write the asset here instead of to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether an asset exists
    Exists {
        /// Asset path within the entity's assets folder
        path: String,
    },

    /// Delete an asset
    Rm {
        /// Asset path within the entity's assets folder
        path: String,
    },

    /// List assets in a directory
    Ls {
        /// Directory within the entity's assets folder
        #[arg(default_value = "")]
        dir: String,
    },

    /// Show the change history of an asset
    Log {
        /// Asset path within the entity's assets folder
        path: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        tracing::debug!(error = ?e, "Command failed");
        output(
            &cli.format,
            &serde_json::json!({
                "status": "error",
                "message": e.to_string()
            }),
        );
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let open = || open_fs(cli, &config);

    match &cli.command {
        Commands::Put {
            path,
            file,
            mimetype,
        } => {
            let fs = open()?;
            let raw_bytes = std::fs::read(file)?;
            let version = fs.commit(&cli.user, path, &raw_bytes, mimetype.as_deref())?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "path": path,
                    "size": raw_bytes.len(),
                    "version": version
                }),
            );
        }

        Commands::Get {
            path,
            version,
            output: target,
        } => {
            let fs = open()?;
            let mut stream = fs.open_existing(path, *version)?;
            let stream_version = stream.version();
            let content = stream.read();
            match target {
                Some(target) => {
                    std::fs::write(target, &content)?;
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "ok",
                            "path": path,
                            "size": content.len(),
                            "version": stream_version,
                            "output": target.display().to_string()
                        }),
                    );
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&content)?;
                    stdout.flush()?;
                }
            }
        }

        Commands::Exists { path } => {
            let fs = open()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "path": path,
                    "exists": fs.isfile(path)?
                }),
            );
        }

        Commands::Rm { path } => {
            let fs = open()?;
            fs.delete(&cli.user, path)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "path": path
                }),
            );
        }

        Commands::Ls { dir } => {
            let fs = open()?;
            let files = fs.listdir(dir)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "count": files.len(),
                    "files": files
                }),
            );
        }

        Commands::Log { path } => {
            let fs = open()?;
            let revisions: Vec<_> = fs
                .history(path)?
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "version": r.version,
                        "command": r.command.to_string(),
                        "author": r.author,
                        "message": r.message,
                        "timestamp": r.timestamp,
                        "size": r.size,
                        "digest": r.digest.map(|d| d.short())
                    })
                })
                .collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "path": path,
                    "backend": fs.backend_kind().to_string(),
                    "count": revisions.len(),
                    "revisions": revisions
                }),
            );
        }

        Commands::Config => {
            output(&cli.format, &serde_json::to_value(&config)?);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<VfsConfig> {
    let mut config = VfsConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(bucket) = &cli.bucket {
        config.bucket = bucket.clone();
    }
    Ok(config)
}

fn open_fs(cli: &Cli, config: &VfsConfig) -> anyhow::Result<FileSystem> {
    let entity_id = cli
        .entity_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--entity-id is required"))?;
    let entity = EntityRef::parse(&cli.entity_type, entity_id)?;
    Ok(FileSystem::from_config(config, entity)?)
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    if let Ok(rendered) = rendered {
        println!("{}", rendered);
    }
}
