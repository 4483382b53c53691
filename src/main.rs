use stock_sentiment::{init_tracing, load_config, run_pipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    tracing::info!("Starting Reddit sentiment pipeline");

    let config = load_config()?;
    let reports = run_pipeline(&config).await?;

    let skipped: usize = reports.iter().map(|r| r.skipped_count()).sum();
    tracing::info!(
        "Pipeline finished: {} stages, {} skipped item(s)",
        reports.len(),
        skipped
    );
    Ok(())
}
