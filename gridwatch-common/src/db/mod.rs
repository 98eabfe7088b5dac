//! Database record models

pub mod models;

pub use models::*;
