//! Application bootstrap.
//!
//! [`AgroTileApp`] wires the service graph in dependency order:
//!
//! ```text
//! AsyncReqwestClient ─► ProviderTokenCache ─► SentinelHubProvider ─┐
//!                                                                   ▼
//! MemoryCacheProvider ─► TileCacheStore ───────────────► TileFetchGateway
//!                                                                   │
//! InMemoryJobStore ─────────────────────────────► PreprocessJobManager
//!                                                                   │
//!                                                     axum router ◄─┘
//! ```
//!
//! ```ignore
//! use agrotile::app::{AgroTileApp, AppConfig};
//! use agrotile::config::ConfigFile;
//!
//! let app = AgroTileApp::start(AppConfig::from_config_file(&ConfigFile::load()?))?;
//! app.serve(shutdown_token).await?;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::AgroTileApp;
pub use config::{AppConfig, ProviderAppConfig};
pub use error::AppError;
