//! Affiliate Market Server
//!
//! Production server for the marketplace backend:
//! - Shopify webhook receiver (`POST /webhooks/shopify`)
//! - Affiliate link redirect (`GET /affiliate/redirect`)
//! - Health, readiness and OpenAPI endpoints
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AM_API_PORT` | `8080` | HTTP API port |
//! | `AM_BIND_ADDRESS` | `0.0.0.0` | Bind address |
//! | `AM_STORE` | `mongo` | Record store: `mongo` or `memory` |
//! | `AM_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `AM_MONGO_DB` | `affiliate_market` | MongoDB database name |
//! | `SHOPIFY_WEBHOOK_SECRET` | - | Shared webhook signing secret |
//! | `AM_DEFAULT_COMMISSION_RATE` | `20` | Rate used when a product has none |
//! | `AM_STORE_TIMEOUT_MS` | `5000` | Upper bound per store call |
//! | `AM_LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use am_common::logging::{self, LogFormat};
use am_platform::api::{create_router, ApiDoc};
use am_platform::repository::ensure_indexes;
use am_platform::{InMemoryStore, Repositories, WebhookConfig, WebhookProcessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Mongo,
    Memory,
}

/// Affiliate Market Server
#[derive(Parser, Debug)]
#[command(name = "am-server")]
#[command(about = "Shopify webhook intake, commission attribution and affiliate redirects")]
struct Args {
    /// API server port
    #[arg(long, env = "AM_API_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind
    #[arg(long, env = "AM_BIND_ADDRESS", default_value = "0.0.0.0")]
    bind_address: String,

    /// Record store backend
    #[arg(long, env = "AM_STORE", value_enum, default_value = "mongo")]
    store: StoreKind,

    /// MongoDB connection URL
    #[arg(long, env = "AM_MONGO_URL", default_value = "mongodb://localhost:27017")]
    mongo_url: String,

    /// MongoDB database name
    #[arg(long, env = "AM_MONGO_DB", default_value = "affiliate_market")]
    mongo_db: String,

    /// Shared secret from the Shopify app settings
    #[arg(long, env = "SHOPIFY_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Commission rate (percent) for products without one
    #[arg(long, env = "AM_DEFAULT_COMMISSION_RATE", default_value = "20")]
    default_commission_rate: Decimal,

    /// Timeout for each record store call, in milliseconds
    #[arg(long, env = "AM_STORE_TIMEOUT_MS", default_value = "5000")]
    store_timeout_ms: u64,

    /// Log output format
    #[arg(long, env = "AM_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

impl Args {
    fn webhook_config(&self) -> Result<WebhookConfig> {
        if self.default_commission_rate < Decimal::ZERO || self.default_commission_rate > Decimal::ONE_HUNDRED {
            anyhow::bail!(
                "Default commission rate must be between 0 and 100, got {}",
                self.default_commission_rate
            );
        }

        Ok(WebhookConfig {
            secret: self.webhook_secret.clone(),
            default_commission_rate: self.default_commission_rate,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_format);

    info!("Starting Affiliate Market Server");

    let config = args.webhook_config()?;
    if config.signing_secret().is_err() {
        error!("SHOPIFY_WEBHOOK_SECRET is not set, every webhook will be answered with 500");
    }
    info!(?config, "Webhook configuration loaded");

    let repos = match args.store {
        StoreKind::Mongo => {
            info!("Connecting to MongoDB: {}/{}", args.mongo_url, args.mongo_db);
            let client = mongodb::Client::with_uri_str(&args.mongo_url).await?;
            let db = client.database(&args.mongo_db);
            ensure_indexes(&db).await?;
            Repositories::mongo(&db)
        }
        StoreKind::Memory => {
            warn!("Using in-memory record store, data is lost on restart");
            Repositories::in_memory(Arc::new(InMemoryStore::new()))
        }
    };

    let processor = Arc::new(WebhookProcessor::new(repos.clone(), config));

    let app = create_router(processor, &repos)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.bind_address, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Affiliate Market Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["am-server"]).unwrap();

        assert_eq!(args.port, 8080);
        assert_eq!(args.store, StoreKind::Mongo);
        assert_eq!(args.log_format, LogFormat::Text);

        let config = args.webhook_config().unwrap();
        assert_eq!(config.default_commission_rate, Decimal::from(20));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_flags_override() {
        let args = Args::try_parse_from([
            "am-server",
            "--store",
            "memory",
            "--webhook-secret",
            "shpss_x",
            "--default-commission-rate",
            "12.5",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.store, StoreKind::Memory);
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.webhook_config().unwrap().signing_secret().unwrap(), "shpss_x");
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let args = Args::try_parse_from(["am-server", "--default-commission-rate", "150"]).unwrap();
        assert!(args.webhook_config().is_err());
    }
}
