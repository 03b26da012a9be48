//! Reference entities served by the API.

pub mod training;
pub mod user;
