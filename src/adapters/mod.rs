//! Adapters - implementations of the ports against real infrastructure,
//! plus in-memory and mock variants for tests.

pub mod clerk;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod whop;
