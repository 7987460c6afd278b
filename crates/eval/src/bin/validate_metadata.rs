use anyhow::{Context, Result};
use eval::validate_store;
use store::JsonDirStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "results/output_json".to_string());

    let store = JsonDirStore::new(&dir);
    let reports = validate_store(&store)
        .await
        .with_context(|| format!("Failed to read stored documents from {dir}"))?;

    for report in &reports {
        println!("\n{report}{}", "-".repeat(40));
    }

    let complete = reports.iter().filter(|r| r.is_complete()).count();
    println!("\n{complete}/{} documents have complete metadata", reports.len());
    Ok(())
}
