pub mod credit;
pub mod media;
pub mod status;
pub mod user;
