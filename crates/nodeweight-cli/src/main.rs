use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::replay::OutputFormat;

#[derive(Parser)]
#[command(
    name = "nodeweight",
    about = "Resolve load-balancing weights from node annotations",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the weight for a set of node annotations
    Resolve {
        /// Annotation as key=value (repeatable)
        #[arg(short, long = "annotation", value_name = "KEY=VALUE")]
        annotations: Vec<String>,
        #[command(flatten)]
        settings: Settings,
    },
    /// Replay a JSON-lines event stream through the weight cache.
    ///
    /// Each line is an add, update, or delete event. Lines that fail to
    /// decode are logged and skipped.
    Replay {
        /// Event file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        events: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        settings: Settings,
    },
    /// Write a nodeweight.toml scaffold
    Init {
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// Overwrite an existing nodeweight.toml
        #[arg(long)]
        force: bool,
    },
}

/// Weight settings shared by subcommands. Flags override the config file.
#[derive(clap::Args)]
struct Settings {
    /// Path to nodeweight.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Annotation key holding the node weight
    #[arg(short, long)]
    key: Option<String>,
    /// Weight used when the annotation is missing or invalid
    #[arg(short, long)]
    default_weight: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,nodeweight=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { annotations, settings } => {
            let config = commands::load_config(settings.config.as_deref(), settings.key, settings.default_weight)?;
            commands::resolve::resolve(&annotations, &config)
        }
        Commands::Replay { events, format, settings } => {
            let config = commands::load_config(settings.config.as_deref(), settings.key, settings.default_weight)?;
            commands::replay::replay(&events, format, &config)
        }
        Commands::Init { path, force } => commands::init::init(&path, force),
    }
}
