//! Authenticated billing API: invoices, payment methods, checkouts, plans.

pub mod dto;
pub mod handlers;
pub mod routes;
