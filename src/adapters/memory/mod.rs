//! In-memory repository implementations.
//!
//! Back the repository ports with plain vectors behind async locks. Used by
//! unit and integration tests, and useful for running the HTTP surface
//! without a database.

mod invoice_repository;
mod payment_method_repository;
mod user_repository;

pub use invoice_repository::InMemoryInvoiceRepository;
pub use payment_method_repository::InMemoryPaymentMethodRepository;
pub use user_repository::InMemoryUserRepository;
