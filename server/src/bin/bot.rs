//! Headless client that joins a room and steers a snake at random.
//!
//! Useful for filling a room or smoke-testing a server without a window.

use clap::Parser;
use log::{debug, info, warn};
use rand::Rng;
use shared::compression::decompress_game_state;
use shared::{
    decode_packet, encode_packet, get_timestamp, Direction, GameState, Packet, MAX_DATAGRAM_SIZE,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name
    #[arg(short, long, default_value = "bot")]
    name: String,

    /// Room code to join
    #[arg(short, long, default_value = "")]
    room: String,

    /// Ask the server to start the game once joined as host
    #[arg(long)]
    start: bool,

    /// Seconds to stay connected
    #[arg(short, long, default_value = "30")]
    duration: u64,
}

async fn send(
    socket: &UdpSocket,
    server: SocketAddr,
    packet: &Packet,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&encode_packet(packet)?, server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let server: SocketAddr = args.server.parse()?;
    info!("Bot bound to {}, joining {}", socket.local_addr()?, server);

    send(
        &socket,
        server,
        &Packet::Join {
            name: args.name.clone(),
            room: args.room.clone(),
        },
    )
    .await?;

    let mut rng = rand::thread_rng();
    let mut player_id = None;
    let mut state: Option<GameState> = None;
    let mut snapshots = 0u32;

    let mut steer = interval(Duration::from_millis(250));
    let mut ping = interval(Duration::from_secs(1));
    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,

            result = socket.recv_from(&mut buffer) => {
                let (len, _) = result?;
                match decode_packet(&buffer[..len]) {
                    Ok(Packet::Joined { player_id: id, room, host }) => {
                        info!("Joined room {} as player {} (host: {})", room, id, host);
                        player_id = Some(id);
                        if host && args.start {
                            send(&socket, server, &Packet::StartGame).await?;
                        }
                    }
                    Ok(Packet::GameStarted) => {
                        info!("Game started");
                        state = None;
                    }
                    Ok(Packet::FullState { state: full, .. }) => {
                        state = Some(full);
                        snapshots += 1;
                    }
                    Ok(Packet::CompressedState { compressed, .. }) => {
                        let stale = state.as_ref().map_or(false, |s| compressed.tick <= s.tick);
                        if !stale {
                            state = Some(decompress_game_state(&compressed, state.as_ref()));
                            snapshots += 1;
                        }
                    }
                    Ok(Packet::GameEnded { results }) => {
                        for result in results {
                            info!("#{} {} score={}", result.rank, result.player_name, result.score);
                        }
                    }
                    Ok(Packet::Pong { timestamp }) => {
                        debug!("RTT {}ms", get_timestamp().saturating_sub(timestamp));
                    }
                    Ok(Packet::Rejected { reason }) => {
                        warn!("Rejected: {}", reason);
                        return Ok(());
                    }
                    Ok(other) => debug!("Ignoring {:?}", other),
                    Err(e) => warn!("Bad datagram: {}", e),
                }
            }

            _ = steer.tick() => {
                let current = state
                    .as_ref()
                    .zip(player_id)
                    .and_then(|(s, id)| s.snake_by_player(id))
                    .filter(|snake| snake.alive)
                    .map(|snake| snake.direction);

                if let Some(current) = current {
                    let turn = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
                    if !turn.is_opposite(current) {
                        let input = Packet::Input { direction: turn, timestamp: get_timestamp() };
                        send(&socket, server, &input).await?;
                    }
                }
            }

            _ = ping.tick() => {
                send(&socket, server, &Packet::Ping { timestamp: get_timestamp() }).await?;
            }
        }
    }

    send(&socket, server, &Packet::Leave).await?;
    info!("Bot leaving after {} snapshots", snapshots);
    Ok(())
}
