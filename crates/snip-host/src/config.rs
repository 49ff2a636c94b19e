use std::net::SocketAddr;
use std::path::PathBuf;

use snip_core::SavePolicy;

use crate::runner::RunnerConfig;

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Socket address the HTTP server binds to.
    pub bind: SocketAddr,
    /// Storage root for snippet files, created on first use.
    pub root: PathBuf,
    /// Save semantics for PUT on an existing file.
    pub save_policy: SavePolicy,
    /// Execution collaborator settings.
    pub runner: RunnerConfig,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8484)),
            root: PathBuf::from("snippets"),
            save_policy: SavePolicy::default(),
            runner: RunnerConfig::default(),
        }
    }
}
