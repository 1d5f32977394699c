pub mod auth;
pub mod dashboard;
pub mod expenses;
pub mod policies;
pub mod reports;
pub mod team;
