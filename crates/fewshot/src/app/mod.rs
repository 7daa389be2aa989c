//! Application layer orchestrating domain logic and infrastructure.

pub mod dataset;
pub mod export;
pub mod record;
pub mod render;
pub mod session;
