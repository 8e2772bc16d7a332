//! saas-catalog - plan catalog and subscription actions for SaaS billing
//!
//! Register the plans, features and one-off items your product sells, hook
//! up per-feature usage metering, and drive subscriptions (checkout,
//! subscribe, swap, resume, cancel) against your own billing entities.
//!
//! # Features
//!
//! - **Catalog**: plans with features, metered features and yearly prices; items with currencies
//! - **Usage sync**: one usage source per feature id
//! - **Subscription actions**: trial gating and a proration toggle over pluggable collaborators
//! - **HTTP**: read-only Axum routes over a shared catalog
//! - **Testing**: mock collaborators behind the `test-billing` feature
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use saas_catalog::{ConfigBuilder, billing::{Catalog, Feature, SharedCatalog}};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     saas_catalog::init_tracing();
//!
//!     let config = ConfigBuilder::new()
//!         .from_env()
//!         .build()
//!         .expect("invalid configuration");
//!
//!     let mut catalog = Catalog::from_config(&config.billing);
//!     catalog
//!         .register_plan("Starter", "price_starter", None)
//!         .feature(Feature::new("Projects", "projects").value(3.0));
//!
//!     let app = saas_catalog::http::router(SharedCatalog::new(catalog));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod billing;
mod config;
mod error;
pub mod http;
pub mod utils;

// Re-exports for public API
pub use config::{BillingConfig, Config, ConfigBuilder, LoggingConfig, MAX_TRIAL_DAYS, TrialConfig};
pub use error::{ErrorResponse, Result, SaasError};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// Call this early in `main()`.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "saas_catalog=debug")
/// - `SAAS_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = utils::get_env_flag("LOG_JSON").unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    install_subscriber(EnvFilter::new(&config.logging.level), config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
