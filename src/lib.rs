//! Kylo Library
//!
//! Daily calorie and macro targets, and a food log to track them against.

pub mod auth;
pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod state;
pub mod tools;
