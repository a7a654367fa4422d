//! Verifier configuration.
//!
//! The only thing a verifier needs to know is where the provider publishes
//! its configuration document. HTTP timeouts are optional: by default the key
//! fetch is unbounded and the host bounds latency by dropping the future.
//!
//! # Examples
//!
//! ```toml
//! config_url = "https://api.travis-ci.com/config"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! ```

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Result, WebhookError};

/// Configuration endpoint for builds on travis-ci.org.
pub const TRAVIS_ORG_CONFIG_URL: &str = "https://api.travis-ci.org/config";

/// Configuration endpoint for builds on travis-ci.com.
pub const TRAVIS_COM_CONFIG_URL: &str = "https://api.travis-ci.com/config";

/// Settings for [`HttpKeySource`](crate::key::HttpKeySource).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Provider configuration endpoint holding the webhook public key.
    #[serde(default = "default_config_url")]
    pub config_url: String,

    /// Total request timeout in seconds for the key fetch.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Connection timeout in seconds for the key fetch.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self { config_url: default_config_url(), timeout_secs: None, connect_timeout_secs: None }
    }
}

impl VerifierConfig {
    /// Creates a configuration pointing at `config_url` with no timeouts.
    #[must_use]
    pub fn new(config_url: impl Into<String>) -> Self {
        Self { config_url: config_url.into(), ..Self::default() }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidConfig`] if the TOML is malformed or the
    /// values fail [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use travis_webhook::config::{TRAVIS_COM_CONFIG_URL, VerifierConfig};
    ///
    /// let config = VerifierConfig::from_toml(
    ///     r#"
    ///     config_url = "https://api.travis-ci.com/config"
    ///     timeout_secs = 15
    ///     "#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(config.config_url, TRAVIS_COM_CONFIG_URL);
    /// assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(15)));
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| WebhookError::InvalidConfig(format!("failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidConfig`] if:
    /// - `config_url` is not an absolute `http` or `https` URL
    /// - `timeout_secs` is set outside 1-300 seconds
    /// - `connect_timeout_secs` is set outside 1-60 seconds
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.config_url).map_err(|e| {
            WebhookError::InvalidConfig(format!("config_url is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WebhookError::InvalidConfig(format!(
                "config_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if let Some(secs) = self.timeout_secs
            && (secs == 0 || secs > 300)
        {
            return Err(WebhookError::InvalidConfig(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if let Some(secs) = self.connect_timeout_secs
            && (secs == 0 || secs > 60)
        {
            return Err(WebhookError::InvalidConfig(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the total request timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the connection timeout, if any.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

fn default_config_url() -> String {
    TRAVIS_ORG_CONFIG_URL.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_org_endpoint() {
        let config = VerifierConfig::default();
        assert_eq!(config.config_url, TRAVIS_ORG_CONFIG_URL);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.connect_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_empty_uses_defaults() {
        let config = VerifierConfig::from_toml("").unwrap();
        assert_eq!(config, VerifierConfig::default());
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
            config_url = "https://api.travis-ci.com/config"
            timeout_secs = 45
            connect_timeout_secs = 5
        "#;

        let config = VerifierConfig::from_toml(toml).unwrap();
        assert_eq!(config.config_url, TRAVIS_COM_CONFIG_URL);
        assert_eq!(config.timeout(), Some(Duration::from_secs(45)));
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_toml_rejects_unknown_field() {
        let result = VerifierConfig::from_toml("public_key = \"inline\"");
        assert!(matches!(result, Err(WebhookError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut config = VerifierConfig { timeout_secs: Some(0), ..VerifierConfig::default() };
        assert!(config.validate().is_err());

        config.timeout_secs = Some(301);
        assert!(config.validate().is_err());

        config.timeout_secs = Some(300);
        assert!(config.validate().is_ok());

        config.connect_timeout_secs = Some(61);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(VerifierConfig::new("not a url").validate().is_err());
        assert!(VerifierConfig::new("ftp://api.travis-ci.org/config").validate().is_err());
        assert!(VerifierConfig::new("http://127.0.0.1:8080/config").validate().is_ok());
    }
}
