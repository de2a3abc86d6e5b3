//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Override the configured attempt budget
    #[arg(long, value_name = "N", global = true)]
    pub max_attempts: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search one region with retry
    Search {
        /// Region to search
        region: String,

        /// Number of calls that fail before the region answers
        #[arg(long, value_name = "N", default_value_t = 0)]
        failures: u32,

        /// Simulated latency per call
        #[arg(long, value_name = "MS", default_value_t = 0)]
        latency_ms: u64,
    },

    /// Search several regions concurrently, keeping whatever succeeds
    Merge {
        /// Regions to search, results are reported in this order
        #[arg(required = true)]
        regions: Vec<String>,

        /// Make a region fail N calls before answering (example: --fail CA=2)
        #[arg(long, value_name = "REGION=N", value_parser = parse_failures)]
        fail: Vec<(String, u32)>,

        /// Simulated latency per call
        #[arg(long, value_name = "MS", default_value_t = 0)]
        latency_ms: u64,
    },

    /// Print a sample configuration file
    Config,
}

fn parse_failures(value: &str) -> Result<(String, u32), String> {
    let (region, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected REGION=N, got '{}'", value))?;
    let count = count
        .parse()
        .map_err(|e| format!("invalid failure count '{}': {}", count, e))?;
    Ok((region.to_string(), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failures() {
        assert_eq!(parse_failures("CA=2"), Ok(("CA".to_string(), 2)));
        assert!(parse_failures("CA").is_err());
        assert!(parse_failures("CA=two").is_err());
    }

    #[test]
    fn test_merge_arguments() {
        let cli = Cli::try_parse_from([
            "tally", "--max-attempts", "2", "merge", "AL", "CA", "TX", "--fail", "CA=1",
        ])
        .unwrap();

        assert_eq!(cli.max_attempts, Some(2));
        match cli.command {
            Commands::Merge { regions, fail, .. } => {
                assert_eq!(regions, vec!["AL", "CA", "TX"]);
                assert_eq!(fail, vec![("CA".to_string(), 1)]);
            }
            _ => panic!("expected merge command"),
        }
    }

    #[test]
    fn test_merge_requires_a_region() {
        assert!(Cli::try_parse_from(["tally", "merge"]).is_err());
    }
}
