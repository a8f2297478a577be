use abyssal::config::Config;
use abyssal::pipeline::BatchRunner;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./data/config/tutorial.json".to_string());

    info!(config = %config_path, "Starting cumulative impact processing...");

    let config = Config::from_file(&config_path)?;
    let runner = BatchRunner::new(config)?;
    let report = runner.process()?;

    for period in &report.summaries {
        info!(period = %period.period, "Habitat summary");
        for summary in &period.habitats {
            info!("  {}", summary);
        }
    }

    info!("Wrote {} files", report.written.len());

    Ok(())
}
