//! Shared configuration, constants and dependency-free types for kalends.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
