//! Database entities.

#![allow(missing_docs)]

pub mod idea;
pub mod vote;

pub use idea::Entity as Idea;
pub use vote::Entity as Vote;
