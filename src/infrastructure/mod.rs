//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! gateway logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for component wiring
//! - [`config`] - Configuration loading and validation

pub mod bootstrap;
pub mod config;
