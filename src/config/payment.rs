//! Payment configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Whop)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Whop API key
    pub whop_api_key: Secret<String>,

    /// Whop company id (`biz_xxx`) the charges are made under
    pub whop_company_id: String,

    /// Whop webhook signing secret
    pub whop_webhook_secret: Secret<String>,

    /// Whop API base URL
    #[serde(default = "default_base_url")]
    pub whop_base_url: String,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.whop_api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("WHOP_API_KEY"));
        }
        if self.whop_company_id.is_empty() {
            return Err(ValidationError::MissingRequired("WHOP_COMPANY_ID"));
        }
        if self.whop_webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("WHOP_WEBHOOK_SECRET"));
        }
        if !self.whop_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidWhopBaseUrl);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://sandbox-api.whop.com/api/v1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            whop_api_key: Secret::new("whop_key_xxx".to_string()),
            whop_company_id: "biz_abc".to_string(),
            whop_webhook_secret: Secret::new("whsec_xxx".to_string()),
            whop_base_url: default_base_url(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_api_key() {
        let mut config = valid_config();
        config.whop_api_key = Secret::new(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_missing_company_id() {
        let mut config = valid_config();
        config.whop_company_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_non_https_base_url() {
        let mut config = valid_config();
        config.whop_base_url = "http://api.whop.com".to_string();
        assert!(config.validate().is_err());
    }
}
