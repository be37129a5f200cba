pub mod base;
pub mod mysql;
