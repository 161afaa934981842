//! Shared foundation for the Trellis graph server: core types, the error
//! enum, and the configuration system.

pub mod config;
pub mod error;
pub mod types;
