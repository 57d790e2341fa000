//! Ports - interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world. Adapters implement these ports.
//!
//! - `UserRepository`, `PaymentMethodRepository`, `InvoiceRepository` -
//!   persistence over the relational store (the single source of truth;
//!   webhook and direct-charge paths coordinate only through its rows)
//! - `PaymentProvider` - the Whop API client contract
//! - `IdentityProvider` - bearer-token verification against Clerk

mod identity_provider;
mod invoice_repository;
mod payment_method_repository;
mod payment_provider;
mod user_repository;

pub use identity_provider::{AuthError, ExternalAccount, IdentityProvider, VerifiedIdentity};
pub use invoice_repository::InvoiceRepository;
pub use payment_method_repository::{InsertOutcome, PaymentMethodRepository};
pub use payment_provider::{CheckoutSession, PaymentError, PaymentProvider, ProviderPayment};
pub use user_repository::UserRepository;
