//! Billing domain - users, payment methods, and invoices.

mod invoice;
mod payment_method;
mod user;

pub use invoice::{Invoice, InvoiceStatus, InvoiceType, NewInvoice};
pub use payment_method::{expiry_month_start, CardDetails, NewPaymentMethod, PaymentMethod};
pub use user::{User, UserIdentity, UserProfile};
