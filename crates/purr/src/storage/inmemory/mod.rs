//! In-memory storage backend.
//!
//! Implements both repository traits over ordered maps wrapped in
//! `Arc<RwLock<_>>`. Backs the test suite and the local dev server when no
//! DynamoDB endpoint is configured.

mod repository;

pub use repository::InMemoryRepository;
