//! Mock [`PaymentProvider`] for tests and local development.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::ports::{CheckoutSession, PaymentError, PaymentProvider, ProviderPayment};

/// A recorded `create_payment` or `create_subscription_payment` call.
#[derive(Debug, Clone)]
pub struct RecordedCharge {
    pub member_id: String,
    pub payment_method_id: String,
    pub amount: Option<f64>,
    pub plan_id: Option<String>,
    pub metadata: Map<String, Value>,
}

/// A recorded checkout creation.
#[derive(Debug, Clone)]
pub struct RecordedCheckout {
    pub plan_id: Option<String>,
    pub redirect_url: Option<String>,
    pub metadata: Map<String, Value>,
}

/// In-memory provider that succeeds (or fails, when configured) without
/// touching the network.
pub struct MockPaymentProvider {
    charges: Mutex<Vec<RecordedCharge>>,
    checkouts: Mutex<Vec<RecordedCheckout>>,
    counter: AtomicU64,
    fail_charges: bool,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            charges: Mutex::new(Vec::new()),
            checkouts: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            fail_charges: false,
        }
    }

    /// A provider whose charge calls are declined.
    pub fn declining() -> Self {
        Self {
            fail_charges: true,
            ..Self::new()
        }
    }

    pub fn charges(&self) -> Vec<RecordedCharge> {
        self.charges.lock().unwrap().clone()
    }

    pub fn checkouts(&self) -> Vec<RecordedCheckout> {
        self.checkouts.lock().unwrap().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}_mock_{}", prefix, n)
    }

    fn check_declined(&self) -> Result<(), PaymentError> {
        if self.fail_charges {
            return Err(PaymentError::Api {
                status: 402,
                body: "card declined".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_setup_checkout(
        &self,
        metadata: Map<String, Value>,
    ) -> Result<CheckoutSession, PaymentError> {
        let id = self.next_id("ch");
        self.checkouts.lock().unwrap().push(RecordedCheckout {
            plan_id: None,
            redirect_url: None,
            metadata,
        });
        Ok(CheckoutSession {
            purchase_url: format!("https://whop.com/checkout/{}", id),
            id,
        })
    }

    async fn create_payment_checkout(
        &self,
        plan_id: &str,
        redirect_url: Option<&str>,
        metadata: Map<String, Value>,
    ) -> Result<CheckoutSession, PaymentError> {
        let id = self.next_id("ch");
        self.checkouts.lock().unwrap().push(RecordedCheckout {
            plan_id: Some(plan_id.to_string()),
            redirect_url: redirect_url.map(str::to_string),
            metadata,
        });
        Ok(CheckoutSession {
            purchase_url: format!("https://whop.com/checkout/{}", id),
            id,
        })
    }

    async fn create_payment(
        &self,
        member_id: &str,
        payment_method_id: &str,
        amount: f64,
        _currency: &str,
        metadata: Map<String, Value>,
    ) -> Result<ProviderPayment, PaymentError> {
        self.check_declined()?;
        self.charges.lock().unwrap().push(RecordedCharge {
            member_id: member_id.to_string(),
            payment_method_id: payment_method_id.to_string(),
            amount: Some(amount),
            plan_id: None,
            metadata,
        });
        Ok(ProviderPayment {
            id: Some(self.next_id("pay")),
            amount: Some(amount),
        })
    }

    async fn create_subscription_payment(
        &self,
        member_id: &str,
        payment_method_id: &str,
        plan_id: &str,
    ) -> Result<ProviderPayment, PaymentError> {
        self.check_declined()?;
        self.charges.lock().unwrap().push(RecordedCharge {
            member_id: member_id.to_string(),
            payment_method_id: payment_method_id.to_string(),
            amount: None,
            plan_id: Some(plan_id.to_string()),
            metadata: Map::new(),
        });
        Ok(ProviderPayment {
            id: Some(self.next_id("pay")),
            amount: None,
        })
    }

    async fn get_plans(&self) -> Result<Value, PaymentError> {
        Ok(json!({"data": []}))
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Value, PaymentError> {
        Ok(json!({"id": plan_id}))
    }
}
