//! `agrotile warm` - submit a preprocess job and wait for it.

use std::path::Path;
use std::time::Duration;

use agrotile::app::AppConfig;
use agrotile::jobs::{JobStatus, PreprocessRequest};
use agrotile::tile::BandSpec;

use super::tile::parse_bands;
use crate::error::CliError;
use crate::runner::CliRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct WarmArgs {
    pub bbox: String,
    pub date: String,
    pub bands: Option<String>,
    pub cloud_mask: bool,
    pub idempotency_key: Option<String>,
}

/// Parses `minLon,minLat,maxLon,maxLat`.
pub fn parse_bbox(value: &str) -> Result<[f64; 4], CliError> {
    let invalid = || {
        CliError::InvalidArgument(format!(
            "bbox must be minLon,minLat,maxLon,maxLat (got '{}')",
            value
        ))
    };

    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    <[f64; 4]>::try_from(parts).map_err(|_| invalid())
}

pub async fn run(args: WarmArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("warm", config_path);
    let app = runner.start_app(AppConfig::from_config_file(runner.config()))?;

    let bands = match args.bands.as_deref() {
        Some(bands) => parse_bands(bands)?,
        None => BandSpec::rgb(),
    };
    let request = PreprocessRequest {
        bbox: parse_bbox(&args.bbox)?,
        date: args.date,
        bands,
        cloud_mask: args.cloud_mask,
    };

    let submitted = app
        .jobs()
        .submit(request, args.idempotency_key.as_deref())?;
    println!("Job {} {}", submitted.job_id, submitted.status);

    let job = loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let Some(job) = app.jobs().job_details(&submitted.job_id) else {
            return Err(CliError::JobFailed {
                job_id: submitted.job_id.to_string(),
                reason: "job disappeared from the store".to_string(),
            });
        };
        if job.status.is_terminal() {
            break job;
        }
    };

    println!(
        "Job {} {}: {} of {} tiles warmed, {} failed",
        job.job_id, job.status, job.tiles_warmed, job.tiles_total, job.tiles_failed
    );

    match job.status {
        JobStatus::Failed => Err(CliError::JobFailed {
            job_id: job.job_id.to_string(),
            reason: job.error.unwrap_or_else(|| "unknown error".to_string()),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        assert_eq!(
            parse_bbox("79.8, 6.9,80.2,7.2").unwrap(),
            [79.8, 6.9, 80.2, 7.2]
        );
    }

    #[test]
    fn test_parse_bbox_rejects_bad_input() {
        for value in ["", "1,2,3", "1,2,3,4,5", "a,b,c,d"] {
            assert!(
                matches!(parse_bbox(value), Err(CliError::InvalidArgument(_))),
                "accepted {value:?}"
            );
        }
    }
}
