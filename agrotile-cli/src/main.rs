//! AgroTile CLI - satellite tile service for farm monitoring.

mod commands;
mod error;
mod runner;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "agrotile", version)]
#[command(about = "Sentinel-2 tile cache and preprocess service", long_about = None)]
struct Cli {
    /// Config file (default: ~/.agrotile/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP service until Ctrl-C
    Serve {
        /// Listen address, overriding [server] bind
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Fetch a single tile and write it to a file
    Tile {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
        z: u8,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        /// Imagery day, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Comma-separated bands (RGB, NIR, SWIR, RED, GREEN, BLUE)
        #[arg(long)]
        bands: Option<String>,
        /// Maximum cloud cover percentage
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        cloud_lt: Option<u8>,
        /// Output file
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Warm the cache for a bounding box and wait for completion
    Warm {
        /// minLon,minLat,maxLon,maxLat
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,
        /// Imagery day, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Comma-separated bands
        #[arg(long)]
        bands: Option<String>,
        #[arg(long)]
        cloud_mask: bool,
        /// Deduplicates identical submissions
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { command } => commands::config::run(command, config_path),
        Commands::Serve { bind } => block_on(commands::serve::run(
            commands::serve::ServeArgs { bind },
            config_path,
        )),
        Commands::Tile {
            z,
            x,
            y,
            date,
            bands,
            cloud_lt,
            output,
        } => {
            let args = commands::tile::TileArgs {
                z,
                x,
                y,
                date,
                bands,
                cloud_lt,
                output,
            };
            block_on(commands::tile::run(args, config_path))
        }
        Commands::Warm {
            bbox,
            date,
            bands,
            cloud_mask,
            idempotency_key,
        } => {
            let args = commands::warm::WarmArgs {
                bbox,
                date,
                bands,
                cloud_mask,
                idempotency_key,
            };
            block_on(commands::warm::run(args, config_path))
        }
    }
}

fn block_on<F>(command: F) -> Result<(), CliError>
where
    F: Future<Output = Result<(), CliError>>,
{
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(command)
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
    fn test_parse_tile() {
        let cli = Cli::try_parse_from([
            "agrotile", "tile", "--z", "12", "--x", "2956", "--y", "1974", "--date",
            "2024-06-01", "--bands", "NIR,RED", "--cloud-lt", "30", "-o", "tile.png",
        ])
        .unwrap();

        match cli.command {
            Commands::Tile {
                z, cloud_lt, bands, ..
            } => {
                assert_eq!(z, 12);
                assert_eq!(cloud_lt, Some(30));
                assert_eq!(bands.as_deref(), Some("NIR,RED"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_tile_rejects_out_of_range() {
        let base = ["agrotile", "tile", "--x", "0", "--y", "0", "--date", "2024-06-01", "-o", "t"];
        let with = |extra: &[&'static str]| {
            let mut args = base.to_vec();
            args.extend_from_slice(extra);
            Cli::try_parse_from(args)
        };

        assert!(with(&["--z", "23"]).is_err());
        assert!(with(&["--z", "5", "--cloud-lt", "101"]).is_err());
        assert!(with(&["--z", "5"]).is_ok());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["agrotile", "config", "path", "--config", "/tmp/a.ini"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.ini")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Path
            }
        ));
    }

    #[test]
    fn test_warm_accepts_negative_bbox() {
        let cli = Cli::try_parse_from([
            "agrotile", "warm", "--bbox", "-5.7,40.1,-5.6,40.2", "--date", "2024-06-01",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Warm { ref bbox, .. } if bbox.starts_with("-5.7")));
    }
}
