//! Shared building blocks for the academy CRUD framework.
//!
//! Holds the types every layer agrees on: identifiers, the domain error,
//! the DTO validation engine, and the pagination wire format used by both
//! the server and the client.

pub mod error;
pub mod pagination;
pub mod response;
pub mod types;
pub mod validation;
