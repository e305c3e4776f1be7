//! `agrotile tile` - fetch one tile through the cache and save it.

use std::path::{Path, PathBuf};

use agrotile::app::AppConfig;
use agrotile::gateway::TileQuery;
use agrotile::tile::BandSpec;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

pub struct TileArgs {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub date: String,
    pub bands: Option<String>,
    pub cloud_lt: Option<u8>,
    pub output: PathBuf,
}

/// Parses a `--bands` value, rejecting names the service does not render.
pub fn parse_bands(csv: &str) -> Result<BandSpec, CliError> {
    let bands = BandSpec::from_csv(csv);
    match bands.first_unsupported() {
        Some(band) => Err(CliError::InvalidArgument(format!(
            "unsupported band '{}'",
            band
        ))),
        None => Ok(bands),
    }
}

pub async fn run(args: TileArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("tile", config_path);
    let app = runner.start_app(AppConfig::from_config_file(runner.config()))?;

    let mut query = TileQuery::new(args.z, args.x, args.y, args.date);
    if let Some(bands) = args.bands.as_deref() {
        query = query.with_bands(parse_bands(bands)?);
    }
    if let Some(cloud_lt) = args.cloud_lt {
        query = query.with_cloud_threshold(cloud_lt);
    }

    let response = app.gateway().get_tile(&query).await?;
    let payload = response.payload().map(|p| &p[..]).unwrap_or_default();

    std::fs::write(&args.output, payload).map_err(|source| CliError::FileWrite {
        path: args.output.clone(),
        source,
    })?;

    info!(
        path = %args.output.display(),
        bytes = payload.len(),
        etag = response.validator(),
        "Tile saved"
    );
    println!(
        "Saved {} ({} bytes, {})",
        args.output.display(),
        payload.len(),
        response.mime_type()
    );
    println!("ETag: \"{}\"", response.validator());

    Ok(())
}
