use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use snip_core::{FileStore, SavePolicy};
use snip_host::config::ServeConfig;
use snip_host::http::{self, HttpState};
use snip_host::runner::Runner;
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(name = "snipd", version, about = "Snippet file service")]
struct Cli {
    /// Socket address to bind (env: SNIPD_BIND)
    #[arg(long, env = "SNIPD_BIND")]
    bind: Option<SocketAddr>,

    /// Storage root for snippet files (env: SNIPD_ROOT)
    #[arg(long, env = "SNIPD_ROOT")]
    root: Option<PathBuf>,

    /// Reject PUT when the file already exists
    #[arg(long)]
    create_only: bool,

    /// Interpreter for .py snippets (env: SNIPD_PYTHON_BIN)
    #[arg(long, env = "SNIPD_PYTHON_BIN")]
    python_bin: Option<String>,

    /// Interpreter for .jac snippets (env: SNIPD_JAC_BIN)
    #[arg(long, env = "SNIPD_JAC_BIN")]
    jac_bin: Option<String>,

    /// Wall-clock limit for one run, in seconds
    #[arg(long)]
    run_timeout_secs: Option<u64>,
}

impl Cli {
    fn into_config(self) -> ServeConfig {
        let mut config = ServeConfig::default();
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(root) = self.root {
            config.root = root;
        }
        if self.create_only {
            config.save_policy = SavePolicy::CreateOnly;
        }
        if let Some(python_bin) = self.python_bin {
            config.runner.python_bin = python_bin;
        }
        if let Some(jac_bin) = self.jac_bin {
            config.runner.jac_bin = jac_bin;
        }
        if let Some(secs) = self.run_timeout_secs {
            config.runner.timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Cli::parse().into_config();

    let store = FileStore::open(&config.root, config.save_policy)
        .with_context(|| format!("open storage root '{}'", config.root.display()))?;
    tracing::info!(root = %store.root().display(), policy = ?store.save_policy(), "store ready");

    let runner = Runner::new(config.runner.clone());
    let state = HttpState::new(Arc::new(store), Arc::new(runner));

    let (shutdown_tx, _) = broadcast::channel(1);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
            let _ = ctrl_c_tx.send(());
        }
    });

    http::serve(config.bind, http::app(state), shutdown_tx)
        .await
        .map_err(anyhow::Error::msg)
}
