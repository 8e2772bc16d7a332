use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::SaasError;
use crate::utils::{get_env_flag, get_env_with_prefix};

/// Main configuration for the catalog and subscription actions
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Settings consumed by the subscription actions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingConfig {
    /// Where checkout returns to on success and on cancel.
    ///
    /// May be absolute, or a path resolved against `app_url`.
    #[serde(default = "default_subscription_index_url")]
    pub subscription_index_url: String,
    /// Base URL of the host application.
    #[serde(default = "default_app_url")]
    pub app_url: Option<String>,
    #[serde(default)]
    pub trial: TrialConfig,
    /// Create prorations when swapping plans.
    #[serde(default = "default_prorate_on_swap")]
    pub prorate_on_swap: bool,
    /// Global currency override for catalog items.
    #[serde(default)]
    pub currency: Option<String>,
}

/// Longest trial `ConfigBuilder::build` accepts, ten years.
pub const MAX_TRIAL_DAYS: u32 = 3650;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrialConfig {
    /// Plan id that grants a trial. No trial plan when unset.
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default = "default_trial_days")]
    pub days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            subscription_index_url: default_subscription_index_url(),
            app_url: default_app_url(),
            trial: TrialConfig::default(),
            prorate_on_swap: default_prorate_on_swap(),
            currency: None,
        }
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            plan_id: None,
            days: default_trial_days(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_subscription_index_url() -> String {
    "/subscription".to_string()
}

fn default_app_url() -> Option<String> {
    Some("http://localhost:8000".to_string())
}

fn default_trial_days() -> u32 {
    7
}

fn default_prorate_on_swap() -> bool {
    true
}

impl BillingConfig {
    /// Resolve the subscription index into an absolute URL.
    ///
    /// A relative index is joined onto `app_url`; without an `app_url` it
    /// fails with [`url::ParseError::RelativeUrlWithoutBase`].
    pub fn subscription_index(&self) -> Result<Url, url::ParseError> {
        match Url::parse(&self.subscription_index_url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .app_url
                    .as_deref()
                    .ok_or(url::ParseError::RelativeUrlWithoutBase)?;
                Url::parse(base)?.join(&self.subscription_index_url)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `plan_id` is the configured trial plan.
    #[must_use]
    pub fn is_trial_plan(&self, plan_id: &str) -> bool {
        self.trial.plan_id.as_deref() == Some(plan_id)
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_billing(mut self, billing: BillingConfig) -> Self {
        self.config.billing = billing;
        self
    }

    pub fn with_subscription_index_url(mut self, url: impl Into<String>) -> Self {
        self.config.billing.subscription_index_url = url.into();
        self
    }

    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.config.billing.app_url = Some(url.into());
        self
    }

    pub fn with_trial_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.config.billing.trial.plan_id = Some(plan_id.into());
        self
    }

    pub fn with_trial_days(mut self, days: u32) -> Self {
        self.config.billing.trial.days = days;
        self
    }

    pub fn with_prorate_on_swap(mut self, enabled: bool) -> Self {
        self.config.billing.prorate_on_swap = enabled;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.config.billing.currency = Some(currency.into());
        self
    }

    /// Load configuration from environment variables with SAAS_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_flag("LOG_JSON") {
            self.config.logging.json = json;
        }

        let billing = &mut self.config.billing;
        if let Some(url) = get_env_with_prefix("SUBSCRIPTION_INDEX_URL") {
            billing.subscription_index_url = url;
        }
        if let Some(url) = get_env_with_prefix("APP_URL") {
            billing.app_url = Some(url);
        }
        if let Some(plan_id) = get_env_with_prefix("TRIAL_PLAN_ID") {
            billing.trial.plan_id = Some(plan_id).filter(|id| !id.is_empty());
        }
        if let Some(days) = get_env_with_prefix("TRIAL_DAYS") {
            match days.parse() {
                Ok(d) => billing.trial.days = d,
                Err(e) => warn!(value = %days, error = %e, "Ignoring invalid TRIAL_DAYS"),
            }
        }
        if let Some(prorate) = get_env_flag("PRORATE_ON_SWAP") {
            billing.prorate_on_swap = prorate;
        }
        if let Some(currency) = get_env_with_prefix("CURRENCY") {
            billing.currency = Some(currency).filter(|c| !c.is_empty());
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid log level
    /// - Subscription index URL that cannot be resolved
    /// - Currency that is not a three-letter code
    /// - Trial longer than [`MAX_TRIAL_DAYS`]
    pub fn build(self) -> crate::error::Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(SaasError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        self.config.billing.subscription_index().map_err(|e| {
            SaasError::bad_request(format!(
                "Invalid subscription index URL {}: {}",
                self.config.billing.subscription_index_url, e
            ))
        })?;

        if let Some(ref currency) = self.config.billing.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(SaasError::bad_request(format!(
                    "Invalid currency code: {}. Must be three letters",
                    currency
                )));
            }
        }

        if self.config.billing.trial.days > MAX_TRIAL_DAYS {
            return Err(SaasError::bad_request(format!(
                "Invalid trial length: {} days. Must be at most {}",
                self.config.billing.trial.days, MAX_TRIAL_DAYS
            )));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.billing.trial.days, 7);
        assert!(config.billing.trial.plan_id.is_none());
        assert!(config.billing.prorate_on_swap);
        assert!(config.billing.currency.is_none());
        assert_eq!(
            config.billing.subscription_index().unwrap().as_str(),
            "http://localhost:8000/subscription"
        );
    }

    #[test]
    fn test_absolute_index_ignores_app_url() {
        let config = ConfigBuilder::new()
            .with_subscription_index_url("https://billing.example.com/account")
            .build()
            .unwrap();
        assert_eq!(
            config.billing.subscription_index().unwrap().as_str(),
            "https://billing.example.com/account"
        );
    }

    #[test]
    fn test_relative_index_without_app_url_is_rejected() {
        let billing = BillingConfig {
            app_url: None,
            ..BillingConfig::default()
        };
        let result = ConfigBuilder::new().with_billing(billing).build();
        assert!(matches!(result, Err(SaasError::BadRequest(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let result = ConfigBuilder::new().with_log_level("loud").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_currency() {
        assert!(ConfigBuilder::new().with_currency("EURO").build().is_err());
        assert!(ConfigBuilder::new().with_currency("usd").build().is_ok());
    }

    #[test]
    fn test_trial_length_limit() {
        let result = ConfigBuilder::new()
            .with_trial_plan("price_trial")
            .with_trial_days(200_000_000)
            .build();
        assert!(matches!(result, Err(SaasError::BadRequest(_))));

        let config = ConfigBuilder::new()
            .with_trial_days(MAX_TRIAL_DAYS)
            .build()
            .unwrap();
        assert_eq!(config.billing.trial.days, MAX_TRIAL_DAYS);
    }

    #[test]
    fn test_is_trial_plan() {
        let config = ConfigBuilder::new().with_trial_plan("price_trial").build().unwrap();
        assert!(config.billing.is_trial_plan("price_trial"));
        assert!(!config.billing.is_trial_plan("price_pro"));
    }

    #[test]
    fn test_from_env_reads_billing_settings() {
        unsafe {
            std::env::set_var("SAAS_TRIAL_PLAN_ID", "price_env_trial");
            std::env::set_var("SAAS_TRIAL_DAYS", "14");
            std::env::set_var("SAAS_PRORATE_ON_SWAP", "false");
            std::env::set_var("SAAS_SUBSCRIPTION_INDEX_URL", "https://app.test/billing");
        }

        let config = ConfigBuilder::new().from_env().build().unwrap();

        unsafe {
            std::env::remove_var("SAAS_TRIAL_PLAN_ID");
            std::env::remove_var("SAAS_TRIAL_DAYS");
            std::env::remove_var("SAAS_PRORATE_ON_SWAP");
            std::env::remove_var("SAAS_SUBSCRIPTION_INDEX_URL");
        }

        assert_eq!(config.billing.trial.plan_id.as_deref(), Some("price_env_trial"));
        assert_eq!(config.billing.trial.days, 14);
        assert!(!config.billing.prorate_on_swap);
        assert_eq!(config.billing.subscription_index_url, "https://app.test/billing");

        unsafe {
            std::env::set_var("SAAS_TRIAL_DAYS", "two weeks");
        }
        let config = ConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(config.billing.trial.days, 7);

        unsafe {
            std::env::set_var("SAAS_TRIAL_DAYS", "200000000");
        }
        let result = ConfigBuilder::new().from_env().build();
        unsafe {
            std::env::remove_var("SAAS_TRIAL_DAYS");
        }
        assert!(matches!(result, Err(SaasError::BadRequest(_))));
    }
}
