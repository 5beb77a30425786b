//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `tini_db` (and to the engine
//! for reconciliation) and map errors via [`crate::error::AppError`].

pub mod auth;
pub mod billing;
pub mod credits;
pub mod media;
