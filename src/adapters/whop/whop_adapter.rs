//! Whop payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Whop REST API.
//! Direct charges use a saved instrument token; checkout configurations
//! hand the card-entry flow to Whop's hosted embed.
//!
//! No automatic retries: a failed call surfaces to the application layer,
//! which records the associated invoice as failed and lets the webhook
//! pipeline reconcile later.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Map, Value};

use crate::config::PaymentConfig;
use crate::ports::{CheckoutSession, PaymentError, PaymentProvider, ProviderPayment};

/// Request timeout for all Whop API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Whop API client.
pub struct WhopAdapter {
    api_key: Secret<String>,
    company_id: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl WhopAdapter {
    /// Creates an adapter from payment configuration.
    pub fn new(config: &PaymentConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction only fails on invalid TLS config");

        Self {
            api_key: config.whop_api_key.clone(),
            company_id: config.whop_company_id.clone(),
            base_url: config.whop_base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    async fn post_json(&self, path: &str, payload: Value) -> Result<Value, PaymentError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Self::read_json(response, path).await
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, PaymentError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Self::read_json(response, path).await
    }

    async fn read_json(response: reqwest::Response, path: &str) -> Result<Value, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path, status = status.as_u16(), body = %body, "Whop API call failed");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Transport(format!("Invalid Whop response: {}", e)))
    }

    fn checkout_from_response(value: Value) -> Result<CheckoutSession, PaymentError> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PaymentError::Transport("Checkout response missing id".to_string())
            })?
            .to_string();
        let purchase_url = value
            .get("purchase_url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PaymentError::Transport("Checkout response missing purchase_url".to_string())
            })?
            .to_string();

        Ok(CheckoutSession { id, purchase_url })
    }

    fn payment_from_response(value: &Value) -> ProviderPayment {
        ProviderPayment {
            id: value
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string),
            amount: value
                .get("final_amount")
                .or_else(|| value.get("total"))
                .and_then(Value::as_f64),
        }
    }
}

#[async_trait]
impl PaymentProvider for WhopAdapter {
    async fn create_setup_checkout(
        &self,
        metadata: Map<String, Value>,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut payload = json!({
            "mode": "setup",
            "currency": "usd",
        });
        if !metadata.is_empty() {
            payload["metadata"] = Value::Object(metadata);
        }

        let response = self.post_json("/checkout_configurations", payload).await?;
        Self::checkout_from_response(response)
    }

    async fn create_payment_checkout(
        &self,
        plan_id: &str,
        redirect_url: Option<&str>,
        metadata: Map<String, Value>,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut payload = json!({
            "mode": "payment",
            "plan_id": plan_id,
        });
        if let Some(redirect_url) = redirect_url {
            payload["redirect_url"] = Value::from(redirect_url);
        }
        if !metadata.is_empty() {
            payload["metadata"] = Value::Object(metadata);
        }

        let response = self.post_json("/checkout_configurations", payload).await?;
        Self::checkout_from_response(response)
    }

    async fn create_payment(
        &self,
        member_id: &str,
        payment_method_id: &str,
        amount: f64,
        currency: &str,
        metadata: Map<String, Value>,
    ) -> Result<ProviderPayment, PaymentError> {
        let mut payload = json!({
            "company_id": self.company_id,
            "member_id": member_id,
            "payment_method_id": payment_method_id,
            "plan": {
                "currency": currency,
                "initial_price": amount,
                "plan_type": "one_time",
            },
        });
        if !metadata.is_empty() {
            payload["metadata"] = Value::Object(metadata);
        }

        let response = self.post_json("/payments", payload).await?;
        Ok(Self::payment_from_response(&response))
    }

    async fn create_subscription_payment(
        &self,
        member_id: &str,
        payment_method_id: &str,
        plan_id: &str,
    ) -> Result<ProviderPayment, PaymentError> {
        let payload = json!({
            "company_id": self.company_id,
            "member_id": member_id,
            "payment_method_id": payment_method_id,
            "plan_id": plan_id,
        });

        let response = self.post_json("/payments", payload).await?;
        Ok(Self::payment_from_response(&response))
    }

    async fn get_plans(&self) -> Result<Value, PaymentError> {
        self.get_json("/plans", &[("company_id", self.company_id.as_str())])
            .await
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Value, PaymentError> {
        self.get_json(&format!("/plans/{}", plan_id), &[]).await
    }
}
