//! Library entry for urscan-cli used by integration tests and embedding.

pub mod commands;

pub use commands::{debug, decode, encode, inspect};
