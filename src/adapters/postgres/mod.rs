//! PostgreSQL persistence adapters.

pub mod invoice_repository;
pub mod payment_method_repository;
pub mod user_repository;

pub use invoice_repository::PostgresInvoiceRepository;
pub use payment_method_repository::PostgresPaymentMethodRepository;
pub use user_repository::PostgresUserRepository;
