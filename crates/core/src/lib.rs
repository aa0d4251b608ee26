//! Functional core of the purr API.
//!
//! Routing, value conversion, query construction, search pagination, record
//! and job preparation and the response envelope. Nothing here performs I/O
//! except through the storage traits.

pub mod authorizer;
pub mod codec;
pub mod error;
pub mod jobs;
pub mod query;
pub mod records;
pub mod request;
pub mod resource;
pub mod response;
pub mod search;
pub mod storage;

pub use error::ApiError;
