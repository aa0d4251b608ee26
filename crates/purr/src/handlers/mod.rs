//! Request handlers, one module per resource family.
//!
//! Handlers take the shared state and the inbound request and return a
//! [`Reply`] or an `ApiError`; the dispatcher wraps either into the
//! response envelope.

pub mod jobs;
pub mod records;
pub mod search;

use serde_json::Value;

/// A successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }
}
