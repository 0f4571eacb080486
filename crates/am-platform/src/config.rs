//! Webhook processing configuration

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{PlatformError, Result};

/// Placeholder commission rate (percent) used when a product carries none
pub const DEFAULT_COMMISSION_RATE: Decimal = dec!(20);

#[derive(Clone)]
pub struct WebhookConfig {
    /// Shared secret configured in the Shopify app settings
    pub secret: Option<String>,
    /// Rate applied when the attributed product has no commission rate
    pub default_commission_rate: Decimal,
    /// Upper bound for each call into the record store
    pub store_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            default_commission_rate: DEFAULT_COMMISSION_RATE,
            store_timeout: Duration::from_secs(5),
        }
    }
}

impl WebhookConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// The configured secret. Missing and empty secrets are both fatal
    /// because either one disables webhook authentication.
    pub fn signing_secret(&self) -> Result<&str> {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(PlatformError::configuration("Webhook secret not configured")),
        }
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("default_commission_rate", &self.default_commission_rate)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WebhookConfig::default();
        assert!(config.secret.is_none());
        assert_eq!(config.default_commission_rate, dec!(20));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let config = WebhookConfig::default();
        assert!(matches!(
            config.signing_secret(),
            Err(PlatformError::Configuration { .. })
        ));
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        let config = WebhookConfig::with_secret("");
        assert!(config.signing_secret().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = WebhookConfig::with_secret("shpss_supersecret");
        let shown = format!("{:?}", config);
        assert!(!shown.contains("shpss_supersecret"));
        assert!(shown.contains("<redacted>"));
    }
}
