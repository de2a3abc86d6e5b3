use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tally_config::{ConfigLoader, TallyConfig};
use tally_logging::init_logging;
use tally_resilience::{merge_successes, RetryWrapper};
use tracing::{debug, info, warn};

mod cli;
mod search;

use cli::{Cli, Commands};
use search::SimulatedSearch;

/// Load configuration from file or environment
fn load_config(config_path: Option<&PathBuf>) -> Result<TallyConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Retry one regional search
async fn search_command(wrapper: &RetryWrapper, search: Arc<SimulatedSearch>) -> Result<()> {
    let region = search.region().to_string();
    let operation = {
        let search = search.clone();
        move || {
            let search = search.clone();
            async move { search.search().await }
        }
    };

    match wrapper.wrap(operation, "single")().await {
        Ok(data) => {
            println!("{}: {}", region, data);
            info!("Search finished after {} call(s)", search.calls());
            Ok(())
        }
        Err(trail) => {
            for (attempt, reason) in trail.iter().enumerate() {
                eprintln!("{} attempt {}: {}", region, attempt + 1, reason);
            }
            Err(trail).context(format!("Search in {} failed", region))
        }
    }
}

/// Search every region concurrently and report whatever succeeded
async fn merge_command(wrapper: &RetryWrapper, searches: Vec<Arc<SimulatedSearch>>) -> Result<()> {
    let operations = wrapper.wrap_all(searches.iter().cloned().map(|search| {
        move || {
            let search = search.clone();
            async move { search.search().await }
        }
    }));

    match merge_successes(operations).await {
        Ok(results) => {
            for (search, slot) in searches.iter().zip(&results) {
                match slot {
                    Some(data) => println!("{}: {}", search.region(), data),
                    None => println!("{}: <no result>", search.region()),
                }
            }
            Ok(())
        }
        Err(failure) => {
            for (search, trail) in searches.iter().zip(&failure.failures) {
                for (attempt, reason) in trail.iter().enumerate() {
                    eprintln!("{} attempt {}: {}", search.region(), attempt + 1, reason);
                }
            }
            Err(failure).context("Every regional search failed")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.retry.max_attempts = max_attempts;
    }

    init_logging(&config.logging)?;
    info!("Tally CLI starting");

    let wrapper = RetryWrapper::new(config.retry);
    debug!("Retry policy: {:?}", wrapper.policy());

    match cli.command {
        Commands::Search {
            region,
            failures,
            latency_ms,
        } => {
            let search = SimulatedSearch::new(region, failures, Duration::from_millis(latency_ms));
            search_command(&wrapper, Arc::new(search)).await
        }
        Commands::Merge {
            regions,
            fail,
            latency_ms,
        } => {
            let failures: HashMap<String, u32> = fail.into_iter().collect();
            let searches = regions
                .into_iter()
                .map(|region| {
                    let count = failures.get(&region).copied().unwrap_or(0);
                    Arc::new(SimulatedSearch::new(
                        region,
                        count,
                        Duration::from_millis(latency_ms),
                    ))
                })
                .collect();
            merge_command(&wrapper, searches).await
        }
        Commands::Config => {
            println!("{}", TallyConfig::generate_sample());
            Ok(())
        }
    }
}
