//! Statechart compiler
//!
//! Compiles hierarchical, possibly concurrent UML-style statecharts into
//! executable representations.
//!
//! This library provides functionality for:
//! - Building an arena-backed statechart model (regions, states, transitions)
//! - Encoding the full configuration space as a flat, fixed-size state vector
//! - Compiling transitions into ordered exit/effect/entry actions and vector patches
//! - Rendering a switch-based C dispatcher and a Promela process for model checking
//! - Loading charts from TOML or JSON documents

pub mod analysis;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod statechart;

pub use analysis::{Compilation, compile};
pub use config::Config;
pub use error::{Error, Result};
pub use statechart::{ChartBuilder, StateChart};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
///
/// Logs go to stderr; stdout is reserved for generated code.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "statekit");
    }
}
