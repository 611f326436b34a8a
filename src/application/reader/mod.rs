//! Response reading: envelopes, cleaning, parsing, validation and posting.

pub mod clean;
pub mod config;
pub mod envelope;
pub mod parse;
pub mod posting;
mod reader;
pub mod tabular;
pub mod validate;

pub use config::ReaderConfig;
pub use reader::{ReaderStats, ResponseReader};
