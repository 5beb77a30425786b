//! Role name constants shared between the API layer and the database seed.

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
