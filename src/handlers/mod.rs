pub mod catalog;
pub mod companies;
pub mod health;
pub mod patterns;
