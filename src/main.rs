//! Bare WebSocket harness for the control multiplexer core.
//!
//! Wires a [`cchub::session::Supervisor`] to a plain `tokio::net::TcpListener`
//! accept loop. No TLS, no routing beyond a single `/ws/control/{sessionId}`
//! path, and no real authentication (spec.md §1 leaves all three to an
//! external collaborator); this binary exists so the core is runnable end
//! to end, not as a deployable product surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use cchub::client::{serve, AuthHook, PassthroughAuth};
use cchub::session::controller::SpawnSpec;
use cchub::session::Supervisor;
use cchub::Config;

#[derive(Parser)]
#[command(name = "cchub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Control multiplexer core for CC Hub")]
struct Cli {
    /// Path to a JSON config file; falls back to defaults plus env overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config file/environment.
    #[arg(long)]
    bind_addr: Option<String>,

    /// Override the bind port from the config file/environment.
    #[arg(long)]
    bind_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref());
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(bind_port) = cli.bind_port {
        config.bind_port = bind_port;
    }

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.bind_port)
        .parse()
        .context("invalid bind address")?;
    let listener = TcpListener::bind(addr).await.context("failed to bind listener")?;
    log::info!("cchub listening on {addr}");

    let supervisor = Supervisor::new();
    let auth: Arc<dyn AuthHook> = Arc::new(PassthroughAuth);
    let multiplexer_bin = config.multiplexer_bin.clone();
    let tuning = config.tuning();
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                log::warn!("accept failed: {err}");
                continue;
            }
        };
        log::debug!("accepted connection from {peer}");

        let supervisor = supervisor.clone();
        let auth = Arc::clone(&auth);
        let multiplexer_bin = multiplexer_bin.clone();
        let cwd = cwd.clone();

        tokio::spawn(async move {
            serve(stream, supervisor, auth, move |session_id| SpawnSpec {
                multiplexer_bin: multiplexer_bin.clone(),
                args: vec![
                    "-C".to_string(),
                    "new-session".to_string(),
                    "-A".to_string(),
                    "-s".to_string(),
                    session_id.to_string(),
                ],
                cwd: cwd.clone(),
                session_name: session_id.to_string(),
                tuning,
            })
            .await;
        });
    }
}
