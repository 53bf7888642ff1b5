//! Configuration and dependency initialization.

pub mod dependencies;

pub use dependencies::{ConnectionMode, Dependencies};
