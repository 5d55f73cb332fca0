//! rettam CLI - Command-line interface
//!
//! Usage:
//!   rettam new [--name <name>]
//!   rettam process <name> --text <text>
//!   rettam graph <name> --format html --output graph.html
//!   rettam shell

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use rettam_cli::{commands, shell, ApiClient, GraphFormat};
use rettam_core::config::{AppConfig, LoggingConfig};
use rettam_store::Session;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rettam")]
#[command(about = "Explore entities, dependencies and sentiment extracted from text")]
#[command(version)]
struct Cli {
    /// Exploration store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Base URL of the extraction API
    #[arg(long, global = true)]
    api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an exploration
    New {
        /// Name; defaults to the next "Exploration N"
        #[arg(long)]
        name: Option<String>,
    },
    /// List explorations
    List,
    /// Delete an exploration
    Delete { name: String },
    /// Delete every exploration
    Clear,
    /// Extract metadata for an exploration
    #[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
    Process {
        name: String,
        /// Text to analyze
        #[arg(long)]
        text: Option<String>,
        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print entities, dependencies and noun chunks
    Show { name: String },
    /// Render the metadata graph
    Graph {
        name: String,
        #[arg(long)]
        hide_entities: bool,
        #[arg(long)]
        hide_dependencies: bool,
        #[arg(long, value_enum, default_value = "html")]
        format: GraphFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Dump stored metadata as path/value lines
    Inspect {
        name: String,
        #[arg(long, default_value_t = 4)]
        max_depth: usize,
    },
    /// Interactive session
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let cli = Cli::parse();
    let store_path = cli.store.unwrap_or_else(|| config.store.path.clone());
    let client = ApiClient::new(cli.api.unwrap_or_else(|| config.store.api_url.clone()));
    let mut session = Session::open(store_path);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::New { name } => commands::create(&mut session, name.as_deref(), &mut out)?,
        Commands::List => commands::list(&session, &mut out)?,
        Commands::Delete { name } => commands::delete(&mut session, &name, &mut out)?,
        Commands::Clear => commands::clear(&mut session, &mut out)?,
        Commands::Process { name, text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            commands::process(&mut session, &client, &name, &text, &mut out).await?;
        }
        Commands::Show { name } => commands::show(&session, &name, &mut out)?,
        Commands::Graph {
            name,
            hide_entities,
            hide_dependencies,
            format,
            output,
        } => {
            session.set_show_entities(!hide_entities);
            session.set_show_dependencies(!hide_dependencies);
            let rendered = commands::render_graph(&mut session, &name, format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    writeln!(out, "Wrote {}", path.display())?;
                }
                None => writeln!(out, "{rendered}")?,
            }
        }
        Commands::Inspect { name, max_depth } => {
            commands::inspect(&session, &name, max_depth, &mut out)?
        }
        Commands::Shell => {
            let input = BufReader::new(tokio::io::stdin());
            shell::run(&mut session, &client, input, &mut out).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so command output stays pipeable
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rettam_cli={level},rettam_store={level}",
            level = logging.level
        ))
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
