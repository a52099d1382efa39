//! acomms - continuous acoustic telemetry filter
//!
//! # Usage
//!
//! ```bash
//! # Split a growing vehicle log into category files
//! acomms filter --config configs/config.toml -t raw_dive.txt -f filtered/ -n dive042
//!
//! # USBL fixes, skipping what is already in the log
//! acomms filter --config configs/usbl.toml -t raw_usbl.txt -f filtered/ --from-end
//!
//! # Validate a configuration and try it on sample lines
//! acomms check --config configs/config.toml --line "2022-08-01 12:00:00|SDQ 34:210.5 ..."
//! ```

mod cmd;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// acomms - continuous acoustic telemetry filter
#[derive(Parser, Debug)]
#[command(name = "acomms")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (defaults to configs/config.toml or acomms.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tail a raw log and write one file per category
    Filter(cmd::filter::FilterArgs),

    /// Validate the configuration and optionally decode sample lines
    Check(cmd::check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Filter(args) => {
            let level = logging::resolve_log_level(cli.log_level.as_deref(), &config.log);
            logging::init_logging(&level, &config.log)?;
            cmd::filter::run(args, config).await
        }
        // Check prints its report to stdout and needs no logging
        Command::Check(args) => cmd::check::run(args, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_filter_command() {
        let cli = Cli::try_parse_from([
            "acomms",
            "filter",
            "-t",
            "raw_dive.txt",
            "-f",
            "filtered",
            "-n",
            "dive042",
            "--config",
            "configs/config.toml",
            "--from-end",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("configs/config.toml")));
        let Command::Filter(args) = cli.command else {
            panic!("expected filter command");
        };
        assert_eq!(args.target, Some(PathBuf::from("raw_dive.txt")));
        assert_eq!(args.output_dir, Some(PathBuf::from("filtered")));
        assert_eq!(args.name.as_deref(), Some("dive042"));
        assert!(args.from_end);
    }

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from(["acomms", "check", "--line", "a", "--line", "b"]).unwrap();
        let Command::Check(args) = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(args.lines, vec!["a".to_string(), "b".to_string()]);
    }
}
