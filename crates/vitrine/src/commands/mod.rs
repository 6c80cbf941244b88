//! CLI command implementations.

pub mod build;
pub mod check;
pub mod compile;
pub mod config;
pub mod init;
