//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `purr_core::storage`.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! The in-memory backend is always compiled; it backs the tests and the
//! local dev server.
//!
//! Build without DynamoDB:
//! ```bash
//! cargo build -p purr --no-default-features
//! ```

pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryRepository;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRepository;
