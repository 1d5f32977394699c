pub mod auth;
pub mod storage;

pub use auth::{create_token, hash_password, verify_password, verify_token};
