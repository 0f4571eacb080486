//! Affiliate Market Platform
//!
//! Server-side core of the creator/store-owner affiliate marketplace:
//! - Shopify webhook signature verification
//! - Topic dispatch for order and product events
//! - Affiliate code attribution from order metadata
//! - Commission split between creator, store owner and platform
//! - Affiliate link click tracking and redirects

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod config;
pub mod error;

pub use domain::*;
pub use config::WebhookConfig;
pub use error::PlatformError;
pub use repository::{InMemoryStore, Repositories};
pub use service::{ProcessOutcome, WebhookProcessor};
