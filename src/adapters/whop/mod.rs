//! Whop payment platform adapters.

pub mod mock_payment_provider;
pub mod whop_adapter;

pub use mock_payment_provider::{MockPaymentProvider, RecordedCharge, RecordedCheckout};
pub use whop_adapter::WhopAdapter;
