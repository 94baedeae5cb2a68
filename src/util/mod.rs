//! Shared utilities

pub mod math;
pub mod time;
