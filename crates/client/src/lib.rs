//! Client-side controllers for the academy CRUD surface.
//!
//! [`list::PaginatedList`] keeps a cached page window in step with the
//! server across mutations; [`editor::EntityEditor`] drives the create,
//! update, and delete dialogs on top of it. Both talk to the server through
//! the [`api::EntityApi`] collaborator and share only the wire types of
//! `academy_core`.

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod list;
pub mod notify;
