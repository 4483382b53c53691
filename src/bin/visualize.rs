use stock_sentiment::{init_tracing, load_config, run_visualize};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = load_config()?;
    run_visualize(&config)?;
    Ok(())
}
