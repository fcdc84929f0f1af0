//! Core business logic for ideavote.

pub mod services;
pub mod test_utils;

pub use services::*;
