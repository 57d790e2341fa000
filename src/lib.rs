//! Paysync - billing backend over the Whop payments platform.
//!
//! Reconciles Whop webhook deliveries against locally stored invoices and
//! payment methods, and exposes an authenticated API for charges,
//! subscriptions, and instrument management.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
