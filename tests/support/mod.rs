#![allow(dead_code)]

pub mod architecture;
pub mod harness;

pub use harness::{harness, harness_with, Harness};
