//! Academy API server library.
//!
//! Exposes the generic CRUD building blocks (validation extractor, service,
//! entity router, error boundary) and the reference routes so integration
//! tests and the binary entrypoint can both access them.

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod hooks;
pub mod middleware;
pub mod query;
pub mod router;
pub mod routes;
pub mod service;
pub mod state;
