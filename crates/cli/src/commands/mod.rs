pub mod baseline;
pub mod check;
pub mod health;
pub mod summary;
