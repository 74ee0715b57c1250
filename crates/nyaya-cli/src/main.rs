mod batch;
mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nyaya_core::EngineConfig;
use nyaya_engine::Engine;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nyaya")]
#[command(about = "Classify legal questions and retrieve the governing provisions")]
#[command(version)]
struct Cli {
    /// TOML configuration file (scoring, validation, defaults, data paths)
    #[arg(long, short, global = true, env = "NYAYA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lexicon dataset; overrides the config file (default: bundled)
    #[arg(long, global = true, value_name = "FILE")]
    lexicon: Option<PathBuf>,

    /// Provision dataset; overrides the config file (default: bundled)
    #[arg(long, global = true, value_name = "FILE")]
    provisions: Option<PathBuf>,

    /// Legal route dataset; overrides the config file (default: bundled)
    #[arg(long, global = true, value_name = "FILE")]
    routes: Option<PathBuf>,

    /// Glossary dataset; overrides the config file (default: bundled)
    #[arg(long, global = true, value_name = "FILE")]
    glossary: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one question and show the retrieved provisions
    Query {
        /// The question, in plain language
        text: String,

        /// Jurisdiction code or alias (e.g. IN, UK, Dubai); skips detection
        #[arg(long, short)]
        jurisdiction: Option<String>,

        /// Domain name (e.g. criminal, civil); skips domain detection
        #[arg(long, short)]
        domain: Option<String>,

        /// Print the result as JSON instead of a card
        #[arg(long)]
        json: bool,
    },
    /// Answer newline-delimited questions from a file, one JSON line each
    Batch {
        /// Input file, one question per line ("-" reads stdin)
        file: PathBuf,

        /// Questions processed at once
        #[arg(long, short = 'n', default_value_t = 4)]
        concurrency: usize,
    },
    /// List loaded jurisdictions with their aliases and domains
    Jurisdictions,
    /// Load and validate every dataset, then report counts
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = load_engine(&cli)?;

    match cli.command {
        Command::Query {
            text,
            jurisdiction,
            domain,
            json,
        } => {
            let result = engine
                .classify_and_retrieve(&text, jurisdiction.as_deref(), domain.as_deref())
                .context("query rejected")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let mut card = String::new();
                display::render_result(&mut card, &result)?;
                print!("{card}");
            }
        }
        Command::Batch { file, concurrency } => {
            let stats = batch::run(Arc::new(engine), &file, concurrency).await?;
            info!(
                answered = stats.answered,
                rejected = stats.rejected,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "batch complete"
            );
        }
        Command::Jurisdictions => {
            let mut listing = String::new();
            display::render_jurisdictions(&mut listing, engine.lexicon())?;
            print!("{listing}");
        }
        Command::Check => {
            let mut report = String::new();
            display::render_check(&mut report, &engine)?;
            print!("{report}");
        }
    }

    Ok(())
}

fn load_engine(cli: &Cli) -> anyhow::Result<Engine> {
    let mut config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = &cli.lexicon {
        config.data.lexicon = Some(path.clone());
    }
    if let Some(path) = &cli.provisions {
        config.data.provisions = Some(path.clone());
    }
    if let Some(path) = &cli.routes {
        config.data.routes = Some(path.clone());
    }
    if let Some(path) = &cli.glossary {
        config.data.glossary = Some(path.clone());
    }
    Engine::load(config).context("loading datasets")
}
