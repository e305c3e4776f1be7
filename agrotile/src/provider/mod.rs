//! Satellite imagery providers.
//!
//! A provider turns a geographic footprint, a day and a band selection
//! into rendered image bytes. The only production provider is
//! [`SentinelHubProvider`], which authenticates with OAuth client
//! credentials and renders through the Sentinel Hub process API.
//!
//! HTTP is abstracted behind [`AsyncHttpClient`] so tests can substitute a
//! mock transport.

pub mod evalscript;
pub(crate) mod http;
mod sentinel;
mod token;
mod types;

pub use evalscript::{native_band, EvalScript, EvalScriptBuilder};
pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpResponse};
pub use sentinel::{
    build_process_body, SentinelHubProvider, DATA_SOURCE, DEFAULT_BASE_URL, OUTPUT_FORMAT,
    OUTPUT_SIZE, PROCESS_PATH, TOKEN_PATH,
};
pub use token::{AccessToken, ProviderCredentials, ProviderTokenCache, REFRESH_MARGIN};
pub use types::{ImageryProvider, ProviderError, RenderRequest, RenderedImage};
