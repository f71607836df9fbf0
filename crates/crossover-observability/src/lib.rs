//! Crossover Observability
//!
//! Structured logging setup shared by the CLI commands.

pub mod logging;

pub use logging::{init_default_logging, init_logging, parse_level, LogFormat};
