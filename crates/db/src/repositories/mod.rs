mod credit_repo;
mod media_repo;
mod user_repo;

pub use credit_repo::CreditRepo;
pub use media_repo::MediaRepo;
pub use user_repo::UserRepo;
