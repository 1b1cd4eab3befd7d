pub mod errors;
pub mod file;
pub mod memory;
