//! `agrotile serve` - run the HTTP service until Ctrl-C.

use std::net::SocketAddr;
use std::path::Path;

use agrotile::app::AppConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

pub struct ServeArgs {
    /// Overrides `[server] bind`.
    pub bind: Option<SocketAddr>,
}

pub async fn run(args: ServeArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    runner.log_startup("serve", config_path);

    let mut config = AppConfig::from_config_file(runner.config());
    if let Some(bind) = args.bind {
        config = config.with_bind(bind);
    }
    let app = runner.start_app(config)?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        on_signal.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    println!("Serving on http://{}/api/v1/satellite (Ctrl-C to stop)", app.config().bind);
    app.serve(shutdown).await?;

    info!("Shutdown complete");
    Ok(())
}
