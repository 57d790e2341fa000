//! Domain layer - entities and business rules.
//!
//! No knowledge of HTTP, SQL, or the Whop/Clerk wire formats beyond the
//! payload shapes the webhook pipeline must interpret.

pub mod billing;
pub mod foundation;
pub mod webhook;
