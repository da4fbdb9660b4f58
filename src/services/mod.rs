pub mod companies;
pub mod patterns;
pub mod upstream;
