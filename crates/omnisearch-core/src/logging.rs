//! Tracing subscriber setup

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` does not say otherwise
pub const DEFAULT_DIRECTIVE: &str = "omnisearch=info";

/// Install a global fmt subscriber filtered by `RUST_LOG` plus [`DEFAULT_DIRECTIVE`]
///
/// Fails if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter()?)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn env_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env().add_directive(DEFAULT_DIRECTIVE.parse()?))
}
