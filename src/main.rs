//! # Huji Server - Entry Point
//! src/main.rs
//!
//! Arma la configuración, carga el historial del chat, registra las rutas y
//! arranca el servidor. SIGINT/SIGTERM lo apagan ordenadamente.

use anyhow::Context;
use huji_server::app::{self, MessageStore};
use huji_server::config::Config;
use huji_server::server::{Server, ShutdownHandle};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let config = Config::load()
        .map_err(anyhow::Error::msg)
        .context("could not load configuration")?;
    let server_config = config
        .server_config()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    config.print_summary();

    let store = MessageStore::load(&config.db_path)
        .with_context(|| format!("could not load chat history from {}", config.db_path.display()))?;
    let routes = app::routes(Arc::new(store));

    let server = Server::new(server_config, routes);
    server
        .bind()
        .with_context(|| format!("could not listen on {}", config.address()))?;

    install_signal_handler(server.handle())?;

    server.start()?;
    info!("bye");
    Ok(())
}

#[cfg(unix)]
fn install_signal_handler(handle: ShutdownHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("could not register signal handler")?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "shutdown signal received");
                handle.stop();
            }
        })
        .context("could not spawn signal thread")?;

    Ok(())
}

#[cfg(not(unix))]
fn install_signal_handler(_handle: ShutdownHandle) -> anyhow::Result<()> {
    Ok(())
}
