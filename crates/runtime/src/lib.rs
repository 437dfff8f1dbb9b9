//! Runtime bootstrap: tracing, configuration, artifact loading and the shared engine.

use tracing_subscriber::EnvFilter;

pub mod config;
pub mod engine;
pub mod metrics;
pub mod store;

pub use config::{ArtifactFiles, EngineConfig};
pub use engine::{global, init_global, install_global, Engine};
pub use store::{load_artifacts, Artifacts};

/// Install a stderr `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
