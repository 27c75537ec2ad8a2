use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use meshroom::client::{
    LocalMedia, PeerSummary, RoomSession, RtcAgentBuilder, SessionConfig, SessionEvent,
    SessionHandle,
};
use meshroom::model::{Participant, RoomId};
use meshroom::server::{self, RelayConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshroom", version, about = "Mesh video rooms over a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        /// Overrides MESHROOM_BIND.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print a fresh room id.
    NewRoom,
    /// Join a room headless and chat from stdin.
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
        relay: String,

        #[arg(long)]
        room: String,

        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind } => {
            let mut config = RelayConfig::from_env()?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            info!(
                "Relay config: bind {}, {} ICE server entries",
                config.bind_addr,
                config.ice_servers.len()
            );
            println!(
                "{} ws://{}/ws",
                "📡 Starting relay on".green().bold(),
                config.bind_addr
            );
            server::serve(config).await?;
        }
        Commands::NewRoom => {
            println!("{}", RoomId::generate().to_string().cyan().bold());
        }
        Commands::Join { relay, room, name } => {
            let name = match name {
                Some(name) => name,
                None => Input::<String>::new()
                    .with_prompt("Display name")
                    .interact_text()
                    .context("Failed to read display name")?,
            };
            join(relay, RoomId::from(room), Participant::named(name)).await?;
        }
    }

    Ok(())
}

async fn join(relay: String, room: RoomId, participant: Participant) -> Result<()> {
    let config = SessionConfig::new(relay);
    let (mut session, handle, events) = RoomSession::with_config(
        &config,
        Arc::new(RtcAgentBuilder::new()),
        Arc::new(LocalMedia::receive_only()),
    );

    println!("{} {}", "🚪 Joining room".green().bold(), room.as_str().cyan());
    info!("Joining room '{}' via {}", room, config.relay_url);
    session.join(room, Some(participant)).await?;

    tokio::spawn(print_events(events));
    tokio::spawn(print_peers(session.peers()));
    tokio::spawn(read_stdin(handle));

    session.run().await;
    info!("Session finished");
    println!("{}", "👋 Left the room".yellow());
    Ok(())
}

async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::StateChanged(state) => {
                println!("{} {:?}", "•".dimmed(), state);
            }
            SessionEvent::StreamReceived { peer, stream } => {
                println!(
                    "{} {:?} stream from {}",
                    "🎥".green(),
                    stream.kind,
                    peer.participant.display_name.bold()
                );
            }
            SessionEvent::Chat(msg) => {
                let sender = format!("{}:", msg.sender.participant.display_name);
                println!("{} {}", sender.cyan(), msg.text);
            }
            SessionEvent::Error(err) => {
                eprintln!("{} {}", "✖".red().bold(), err.to_string().red());
            }
        }
    }
}

async fn print_peers(mut peers: watch::Receiver<Vec<PeerSummary>>) {
    while peers.changed().await.is_ok() {
        let names: Vec<String> = peers
            .borrow_and_update()
            .iter()
            .map(|p| format!("{} ({:?})", p.participant.display_name, p.state))
            .collect();
        if names.is_empty() {
            println!("{}", "👥 nobody else here".dimmed());
        } else {
            println!("{} {}", "👥".blue(), names.join(", "));
        }
    }
}

async fn read_stdin(handle: SessionHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim() == "/leave" => break,
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => {
                if handle.send_chat(line).await.is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
    let _ = handle.leave().await;
}
