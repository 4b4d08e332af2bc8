//! wterm demo client
//!
//! Connects the local terminal to a wterm backend over a WebSocket and runs
//! one session to completion. Reconnecting after failure is a matter of
//! running the client again; the session core is single-shot.

mod terminal;
mod transport;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wt_session::{Emulator, SessionConfig, SessionController};

use crate::terminal::StdioTerminal;

#[derive(Parser)]
#[command(name = "wt-client")]
#[command(about = "Interactive terminal session over a WebSocket")]
#[command(version)]
struct Args {
    /// WebSocket endpoint of the shell backend
    /// Example: ws://localhost:8080/ssh
    url: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let emulator = StdioTerminal::new()?;
    emulator.write_line("Connecting ...").await?;

    let (emu_tx, emu_rx) = mpsc::channel(64);
    let _input = terminal::spawn_input_pump(emu_tx.clone());
    let _resize = terminal::spawn_resize_pump(emu_tx);

    let (connection, conn_rx) = transport::connect(args.url);

    let controller = SessionController::new(connection, emulator, SessionConfig::default());
    let state = controller.run(conn_rx, emu_rx).await;
    tracing::info!(?state, "Session finished");

    Ok(())
}
