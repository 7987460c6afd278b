use anyhow::{Context, Result};
use api::config::{AppConfig, OperationMode};
use api::metrics::Metrics;
use api::pipeline::Pipeline;
use api::routes::{AppState, router};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use store::JsonDirStore;

#[derive(Parser)]
#[command(name = "docflow", version, about = "Classify business documents and serve their metadata")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, env = "DOCFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Tuning preset
    #[arg(long, global = true, value_enum)]
    mode: Option<OperationMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve stored documents over HTTP
    Serve,
    /// Classify, extract and store every document in a directory, then evaluate
    Process {
        input_dir: PathBuf,

        /// Write a confusion matrix PNG here
        #[arg(long)]
        plot: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    api::init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), cli.mode)?;
    tracing::info!(mode = ?config.mode, output_dir = %config.storage.output_dir.display(), "Configuration loaded");

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Process { input_dir, plot } => process(config, input_dir, plot).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let store = Arc::new(JsonDirStore::new(config.storage.output_dir.clone()));
    let app = router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    tracing::info!("Server listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

async fn process(config: AppConfig, input_dir: PathBuf, plot: Option<PathBuf>) -> Result<()> {
    let documents = ingest::load_directory(&input_dir)
        .await
        .with_context(|| format!("Failed to load documents from {}", input_dir.display()))?;

    let (model, cache) = api::build_model(&config)?;
    let store = Arc::new(JsonDirStore::new(config.storage.output_dir.clone()));
    tracing::info!(documents = documents.len(), output_dir = %store.dir().display(), "Processing batch");
    let metrics = Metrics::new();
    let pipeline = Pipeline::new(
        model,
        store,
        metrics.clone(),
        config.concurrency.max_concurrent_documents,
    );

    let (processed, summary) = pipeline.process_batch(documents).await;
    if let Some(cache) = cache {
        let stats = cache.stats();
        tracing::info!(entries = stats.entries, hits = stats.hits, misses = stats.misses, "Completion cache");
    }
    let steps = metrics.pipeline_snapshot();
    tracing::info!(
        classified = steps.documents_classified,
        extracted = steps.documents_extracted,
        stored = steps.documents_stored,
        avg_classify_time_ms = steps.avg_classify_time_ms,
        avg_extract_time_ms = steps.avg_extract_time_ms,
        "Pipeline metrics"
    );

    let evaluation = eval::evaluate(&processed);
    println!("{}", evaluation.matrix);
    println!("Classification Report:\n");
    println!("{}", evaluation.report);
    println!(
        "Stored {}/{} documents ({} classification, {} extraction, {} storage failures)",
        summary.stored,
        summary.total,
        summary.classification_failures,
        summary.extraction_failures,
        summary.storage_failures,
    );
    println!(
        "Average step time: classify {:.1} ms, extract {:.1} ms",
        steps.avg_classify_time_ms, steps.avg_extract_time_ms,
    );

    if let Some(path) = plot {
        eval::generate_confusion_plot(&evaluation.matrix, &path)?;
    }
    Ok(())
}
