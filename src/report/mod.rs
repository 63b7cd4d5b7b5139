//! Report rendering: console text, summary files and JSON.

pub mod generator;

pub use generator::*;
