//! Clerk identity provider adapters.

pub mod clerk_adapter;
pub mod mock;

pub use clerk_adapter::ClerkAdapter;
pub use mock::MockIdentityProvider;
