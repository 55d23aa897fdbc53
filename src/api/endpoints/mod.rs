//! API endpoint handlers. Each module maps to one route group.

pub mod health;
pub mod meta;
pub mod resources;
pub mod triage;
