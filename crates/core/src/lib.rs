//! Domain logic for the Tini Studio generation platform.
//!
//! This crate is intentionally free of I/O: generation modes, the credit
//! cost table, submission validation, and the status lifecycle rules all
//! live here so they can be unit-tested without a database or network.

pub mod error;
pub mod media;
pub mod roles;
pub mod types;
