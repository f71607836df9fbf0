//! Crossover Core
//!
//! Core types, traits, and errors shared by the crossover backtester crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::*;
pub use traits::*;
pub use types::*;
