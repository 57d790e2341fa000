//! Foundation - shared primitives for the domain layer.

mod errors;

pub use errors::{DomainError, ErrorCode};
