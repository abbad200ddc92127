// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use hierarchical_qa::server::shutdown_signal;
use hierarchical_qa::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning,
};
use hierarchical_qa::{
    Config, DocumentSource, LlmServices, OperationTimer, QaApplication, QaServer, Validator,
    VectorStoreManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Characters of chunk content printed per result by `query`.
const CLI_PREVIEW_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "hierarchical_qa")]
#[command(author = "cipher")]
#[command(version)]
#[command(
    about = "Hierarchical document Q&A: page summaries narrow the search over detailed chunks",
    long_about = None
)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI
    Serve {
        #[arg(long, env = "HIERARCHICAL_QA_HOST")]
        host: Option<String>,

        #[arg(short, long, env = "HIERARCHICAL_QA_PORT")]
        port: Option<u16>,
    },

    /// Build the vector stores, or load them when they are up to date
    Index {
        #[arg(long)]
        force: bool,

        #[arg(short, long, value_name = "PATH")]
        document: Option<PathBuf>,
    },

    /// Run one hierarchical query and print the chunks found
    Query {
        text: String,

        #[arg(long, value_name = "N")]
        k_summaries: Option<usize>,

        #[arg(long, value_name = "N")]
        k_chunks: Option<usize>,

        #[arg(long, value_name = "N", default_value_t = CLI_PREVIEW_CHARS)]
        preview: usize,
    },

    Stats,

    Health,

    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    hierarchical_qa::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await?,
        Commands::Index { force, document } => cmd_index(config, force, document).await?,
        Commands::Query {
            text,
            k_summaries,
            k_chunks,
            preview,
        } => cmd_query(config, &text, k_summaries, k_chunks, preview).await?,
        Commands::Stats => cmd_stats(config).await?,
        Commands::Health => cmd_health(config).await?,
        Commands::Reset { confirm } => cmd_reset(config, confirm).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")
    } else {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")
    }
}

async fn build_manager(config: &Config) -> Result<VectorStoreManager> {
    let services = LlmServices::from_config(config).context("Failed to set up language model")?;
    VectorStoreManager::new(config.clone(), services)
        .await
        .context("Failed to open vector stores")
}

async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate().context("Invalid server settings")?;

    info!("Hierarchical Q&A System");
    info!("Document: {}", config.document.path.display());

    let server_config = config.server.clone();
    let app = QaApplication::new(config)
        .await
        .context("Failed to start application")?;

    QaServer::new(server_config, Arc::new(app))
        .run(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn cmd_index(mut config: Config, force: bool, document: Option<PathBuf>) -> Result<()> {
    if let Some(path) = document {
        config.document.path = path;
    }
    Validator::validate_document_path(&config.document.path)?;

    let timer = OperationTimer::new("index");
    println!(
        "{}",
        format_step(1, 2, &format!("Indexing {}", config.document.path.display()))
    );

    let manager = build_manager(&config).await?.with_progress(true);
    let source = DocumentSource::File(config.document.path.clone());
    let stores = manager
        .get_or_create_vector_stores(&source, force)
        .await
        .context("Failed to build vector stores")?;

    let summaries = stores.summary.count().await?;
    let chunks = stores.detailed.count().await?;
    println!("{}", format_step(2, 2, "Vector stores ready"));
    println!(
        "{}",
        format_success(&format!("{} summaries, {} detailed chunks", summaries, chunks))
    );
    timer.finish_with_count(summaries + chunks);

    Ok(())
}

async fn cmd_query(
    config: Config,
    text: &str,
    k_summaries: Option<usize>,
    k_chunks: Option<usize>,
    preview: usize,
) -> Result<()> {
    let app = QaApplication::new(config)
        .await
        .context("Failed to start application")?;

    let answer = app
        .get_answer(text, k_summaries, k_chunks)
        .await
        .context("Query failed")?;

    if answer.results.is_empty() {
        println!("{}", format_warning("No relevant chunks found"));
        return Ok(());
    }

    println!("\n{}\n", format_info(&format!("Results for: {}", answer.query)));
    for chunk in &answer.results {
        println!("{}", chunk.format_summary(preview));
    }

    Ok(())
}

async fn cmd_stats(config: Config) -> Result<()> {
    let manager = build_manager(&config).await?;
    let stats = manager.stats().await.context("Failed to gather statistics")?;

    println!("Storage: {}", stats.uri);
    println!("  {}: {} rows", stats.summary_table, stats.summary_count);
    println!("  {}: {} rows", stats.detailed_table, stats.detailed_count);

    match stats.manifest {
        Some(manifest) => {
            println!("Source: {}", manifest.settings.source);
            println!(
                "Embeddings: {} ({} dims)",
                manifest.settings.embedding_model, manifest.settings.embedding_dim
            );
            println!(
                "Chunking: size {} / overlap {}",
                manifest.settings.chunk_size, manifest.settings.chunk_overlap
            );
            println!("Summarizer: {}", manifest.settings.summarizer);
            println!("Built: {}", manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => println!("{}", format_warning("No index manifest; run `index` first")),
    }

    Ok(())
}

async fn cmd_health(config: Config) -> Result<()> {
    let app = QaApplication::new(config)
        .await
        .context("Failed to start application")?;
    let report = app.health().await;

    print!("{}", report.format());

    if report.is_unhealthy() {
        anyhow::bail!("System is unhealthy");
    }
    Ok(())
}

async fn cmd_reset(config: Config, confirm: bool) -> Result<()> {
    if !confirm {
        println!(
            "{}",
            format_error("This deletes both vector stores. Use --confirm to proceed")
        );
        return Ok(());
    }

    warn!("Resetting vector stores - all indexed data will be lost");
    build_manager(&config)
        .await?
        .reset()
        .await
        .context("Failed to reset vector stores")?;

    println!("{}", format_success("Vector stores reset"));
    Ok(())
}
