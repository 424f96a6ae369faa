//! Application layer orchestrating domain logic and infrastructure.

pub mod collect;
pub mod editor;
pub mod payload;
pub mod upload;
