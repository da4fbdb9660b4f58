pub mod annotation;
pub mod catalog;
pub mod company;
pub mod health;
pub mod pattern;
