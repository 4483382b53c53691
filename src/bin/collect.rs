use stock_sentiment::{init_tracing, load_config, run_collect};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = load_config()?;
    run_collect(&config).await?;
    Ok(())
}
