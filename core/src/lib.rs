//! Synod Core Library
//!
//! Core types, traits, and configuration for the Synod single-decree consensus service.
//! This crate provides the foundation for all other Synod components.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
