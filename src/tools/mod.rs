//! Kylo Tools module
//!
//! MCP tool implementations for the Kylo nutrition tracker.

pub mod dashboard;
pub mod diet;
pub mod foods;
pub mod profiles;
pub mod status;
