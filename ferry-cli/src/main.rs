use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use ferry::client::{Client, ClientConfig, ClientEvent, ClientHandle, FileData};
use ferry::model::{IceServerConfig, TransferDirection, TransferRecord};
use ferry::server::{ServerConfig, serve};
use ferry::utils::{DEFAULT_CHUNK_SIZE, DEFAULT_SIGNALING_URL, DEFAULT_STUN_ADDR, format_eta, format_speed};
use ferry::RoomId;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ferry", version, about = "Peer-to-peer file transfer over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "FERRY_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        #[arg(long, env = "FERRY_MAX_CONNECTIONS_PER_IP", default_value_t = 10)]
        max_connections_per_ip: usize,

        #[arg(long, env = "FERRY_MAX_USERS_PER_ROOM", default_value_t = 50)]
        max_users_per_room: usize,

        #[arg(long, env = "FERRY_MAX_ROOMS", default_value_t = 1000)]
        max_rooms: usize,

        #[arg(long, env = "FERRY_MAX_ROOM_ID_LEN", default_value_t = 64)]
        max_room_id_len: usize,

        /// Seconds of silence before a socket is dropped.
        #[arg(long, env = "FERRY_IDLE_TIMEOUT", default_value_t = 300)]
        idle_timeout: u64,

        /// STUN/TURN urls announced to clients.
        #[arg(long = "ice-server", env = "FERRY_ICE_SERVERS", value_delimiter = ',', default_value = DEFAULT_STUN_ADDR)]
        ice_servers: Vec<String>,
    },

    /// Share a file with everyone in a room.
    Send {
        file: PathBuf,

        /// Room to join. A new one is created when omitted.
        #[arg(short, long)]
        room: Option<String>,

        /// Number of connected peers to wait for before sending.
        #[arg(short, long, default_value_t = 1)]
        peers: usize,

        #[arg(long, env = "FERRY_SERVER", default_value = DEFAULT_SIGNALING_URL)]
        server: String,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Wait for files in a room and save them.
    Receive {
        /// Room to join. Prompted for when omitted.
        #[arg(short, long)]
        room: Option<String>,

        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Keep receiving after the first file.
        #[arg(long)]
        keep_open: bool,

        #[arg(long, env = "FERRY_SERVER", default_value = DEFAULT_SIGNALING_URL)]
        server: String,
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
        Commands::Serve {
            bind,
            max_connections_per_ip,
            max_users_per_room,
            max_rooms,
            max_room_id_len,
            idle_timeout,
            ice_servers,
        } => {
            let config = ServerConfig {
                bind,
                max_connections_per_ip,
                max_users_per_room,
                max_rooms,
                max_room_id_len,
                idle_timeout: Duration::from_secs(idle_timeout),
                ice_servers: ice_servers
                    .into_iter()
                    .filter(|url| !url.is_empty())
                    .map(|url| IceServerConfig {
                        urls: vec![url],
                        username: None,
                        credential: None,
                    })
                    .collect(),
            };
            println!("{}", format!("🚀 Ferry relay on {}", bind).green().bold());
            serve(config).await
        }

        Commands::Send {
            file,
            room,
            peers,
            server,
            chunk_size,
        } => {
            let config = ClientConfig {
                signaling_url: server,
                chunk_size,
                ..ClientConfig::default()
            };
            send(config, file, room, peers.max(1)).await
        }

        Commands::Receive {
            room,
            out,
            keep_open,
            server,
        } => {
            let room = match room {
                Some(room) => room,
                None => tokio::task::spawn_blocking(prompt_room).await??,
            };
            let config = ClientConfig {
                signaling_url: server,
                ..ClientConfig::default()
            };
            receive(config, RoomId::from(room), out, keep_open).await
        }
    }
}

fn prompt_room() -> Result<String> {
    dialoguer::Input::<String>::new()
        .with_prompt("Room id")
        .interact_text()
        .context("Failed to read room id")
}

async fn send(config: ClientConfig, path: PathBuf, room: Option<String>, peers: usize) -> Result<()> {
    let file = FileData::from_path(&path).await?;
    println!(
        "{}",
        format!("📦 {} ({} bytes)", file.name, file.size()).cyan()
    );

    let (handle, mut events) = Client::connect(config).await?;
    match room {
        Some(room) => handle.join_room(room).await?,
        None => handle.create_room().await?,
    }
    handle.select_file(file).await?;

    let mut sending = false;
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::PeerCountChanged(n) if !sending && n >= peers => {
                println!("{}", format!("🔗 {} peer(s) connected, sending", n).green());
                handle.send_file().await?;
                sending = true;
            }
            ClientEvent::TransferComplete(record) if record.direction == TransferDirection::Sent => {
                finish_line();
                print_record(&record);
                break;
            }
            ClientEvent::TransferFailed { reason } => {
                finish_line();
                shutdown(&handle).await;
                anyhow::bail!("Transfer failed: {}", reason);
            }
            other => report(&other),
        }
    }

    shutdown(&handle).await;
    Ok(())
}

async fn receive(config: ClientConfig, room: RoomId, out: PathBuf, keep_open: bool) -> Result<()> {
    tokio::fs::create_dir_all(&out)
        .await
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let (handle, mut events) = Client::connect(config).await?;
    handle.join_room(room).await?;

    let result = receive_loop(&mut events, &out, keep_open).await;
    shutdown(&handle).await;
    result
}

async fn receive_loop(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    out: &Path,
    keep_open: bool,
) -> Result<()> {
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::FileReceived { file, .. } => {
                finish_line();
                let path = save(out, &file).await?;
                println!("{}", format!("💾 Saved {}", path.display()).green().bold());
                if !keep_open {
                    return Ok(());
                }
            }
            other => report(&other),
        }
    }

    anyhow::bail!("Client stopped before a file arrived")
}

/// Writes `file` under `dir`, never overwriting an existing file.
async fn save(dir: &Path, file: &FileData) -> Result<PathBuf> {
    let name = Path::new(&file.name)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "received".into());

    let mut path = dir.join(&name);
    let mut n = 1;
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        path = dir.join(format!("{} ({})", name.to_string_lossy(), n));
        n += 1;
    }

    tokio::fs::write(&path, &file.data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn report(event: &ClientEvent) {
    match event {
        ClientEvent::Connected { peer_id } => {
            println!("{}", format!("✅ Connected as {}", peer_id).dimmed());
        }
        ClientEvent::RoomJoined { room_id } => {
            println!("{} {}", "🏠 Room:".cyan().bold(), room_id.to_string().yellow().bold());
        }
        ClientEvent::PeerCountChanged(n) => {
            println!("{}", format!("🔗 {} peer(s) connected", n).cyan());
        }
        ClientEvent::TransferStarted { direction, name, size } => {
            let verb = match direction {
                TransferDirection::Sent => "Sending",
                TransferDirection::Received => "Receiving",
            };
            println!("{}", format!("📡 {} {} ({} bytes)", verb, name, size).cyan());
        }
        ClientEvent::TransferProgress {
            fraction,
            speed,
            eta,
            ..
        } => {
            print!(
                "\r   {:>5.1}%  {:>12}  ETA {:<14}",
                fraction * 100.0,
                format_speed(*speed),
                format_eta(*eta)
            );
            let _ = std::io::stdout().flush();
        }
        ClientEvent::TransferComplete(record) => print_record(record),
        ClientEvent::PeerDisconnected(peer_id) => {
            println!("{}", format!("👋 Peer {} disconnected", peer_id).yellow());
        }
        ClientEvent::ServerError(message) => {
            eprintln!("{}", format!("⚠️  Server: {}", message).red());
        }
        ClientEvent::TransferFailed { reason } => {
            eprintln!("{}", format!("❌ {}", reason).red());
        }
        ClientEvent::FileReceived { .. } => {}
    }
}

fn finish_line() {
    println!();
}

fn print_record(record: &TransferRecord) {
    println!(
        "{}",
        format!(
            "✨ {} {} bytes in {:.1}s ({})",
            record.name,
            record.size,
            record.duration.as_secs_f64(),
            format_speed(record.average_speed)
        )
        .green()
        .bold()
    );
}

async fn shutdown(handle: &ClientHandle) {
    let _ = handle.shutdown().await;
}
