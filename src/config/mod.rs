//! Crawl configuration
//!
//! Network endpoints, retry and quota behavior, and the search plan all come from a configuration
//! file. The defaults reproduce the standard crawl of the Arduino library ecosystem.

#[expect(clippy::module_inception, reason = "the configuration type lives in its own file")]
mod config;

pub use config::{Config, DEFAULT_CONFIG_TOML, ForkFilter, SearchSpec};
