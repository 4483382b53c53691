use stock_sentiment::{init_tracing, load_config, run_score};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = load_config()?;
    run_score(&config)?;
    Ok(())
}
