//! UDP connection and session bookkeeping
//!
//! The render loop runs on macroquad's thread, so socket I/O lives on a
//! background thread with its own single-threaded tokio runtime. Packets cross
//! between the two over channels.

use crate::game::ClientGameState;
use log::{debug, error, info, warn};
use shared::{
    decode_packet, encode_packet, get_timestamp, Direction, GameResult, Packet, MAX_DATAGRAM_SIZE,
};
use std::net::SocketAddr;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};

const PING_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the background socket thread
pub struct Connection {
    outgoing: mpsc::UnboundedSender<Packet>,
    incoming: std_mpsc::Receiver<Packet>,
    thread: JoinHandle<()>,
}

impl Connection {
    /// Binds a local socket and starts the I/O thread. `fake_ping_ms` adds half
    /// the delay on each direction.
    pub fn open(server: &str, fake_ping_ms: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr: SocketAddr = server.parse()?;
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        info!("Client bound to {}", socket.local_addr()?);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming) = std_mpsc::channel();

        let thread = std::thread::spawn(move || {
            runtime.block_on(async move {
                match UdpSocket::from_std(socket) {
                    Ok(socket) => {
                        run_io(socket, server_addr, fake_ping_ms, outgoing_rx, incoming_tx).await
                    }
                    Err(e) => error!("Failed to register socket: {}", e),
                }
            });
        });

        Ok(Self {
            outgoing,
            incoming,
            thread,
        })
    }

    pub fn send(&self, packet: Packet) {
        if self.outgoing.send(packet).is_err() {
            warn!("Network thread has stopped");
        }
    }

    /// Drains everything received since the last call
    pub fn poll(&self) -> Vec<Packet> {
        self.incoming.try_iter().collect()
    }

    /// Sends `Leave` and waits for the I/O thread to flush it
    pub fn close(self) {
        self.send(Packet::Leave);
        let Connection {
            outgoing, thread, ..
        } = self;
        drop(outgoing);
        if thread.join().is_err() {
            error!("Network thread panicked");
        }
    }
}

async fn run_io(
    socket: UdpSocket,
    server: SocketAddr,
    fake_ping_ms: u64,
    mut outgoing: mpsc::UnboundedReceiver<Packet>,
    incoming: std_mpsc::Sender<Packet>,
) {
    let mut ping = interval(PING_INTERVAL);
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
    let half_delay = Duration::from_millis(fake_ping_ms / 2);

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                match result {
                    Ok((len, from)) if from == server => {
                        if fake_ping_ms > 0 {
                            sleep(half_delay).await;
                        }
                        match decode_packet(&buffer[..len]) {
                            Ok(packet) => {
                                if incoming.send(packet).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping undecodable datagram: {}", e),
                        }
                    }
                    Ok((_, from)) => debug!("Ignoring datagram from {}", from),
                    Err(e) => error!("Error receiving packet: {}", e),
                }
            }

            packet = outgoing.recv() => {
                let Some(packet) = packet else { break };
                if fake_ping_ms > 0 {
                    sleep(half_delay).await;
                }
                send_packet(&socket, server, &packet).await;
            }

            _ = ping.tick() => {
                send_packet(&socket, server, &Packet::Ping { timestamp: get_timestamp() }).await;
            }
        }
    }
}

async fn send_packet(socket: &UdpSocket, server: SocketAddr, packet: &Packet) {
    match encode_packet(packet) {
        Ok(data) => {
            if let Err(e) = socket.send_to(&data, server).await {
                error!("Error sending packet: {}", e);
            }
        }
        Err(e) => error!("Error encoding packet: {}", e),
    }
}

/// Everything the client knows about its membership and the current game
pub struct Session {
    pub game: ClientGameState,
    pub player_id: Option<u32>,
    pub room: Option<String>,
    pub is_host: bool,
    pub in_game: bool,
    pub ping_ms: u64,
    pub results: Option<Vec<GameResult>>,
    pub rejection: Option<String>,
    pub interpolation_enabled: bool,
    /// Last turn the server queued for us, with the tick it was queued on
    pub last_ack: Option<(u32, Direction)>,
}

impl Session {
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            game: ClientGameState::new(tick_interval_ms),
            player_id: None,
            room: None,
            is_host: false,
            in_game: false,
            ping_ms: 0,
            results: None,
            rejection: None,
            interpolation_enabled: true,
            last_ack: None,
        }
    }

    /// Heading of the local snake while it is alive
    pub fn local_direction(&self) -> Option<Direction> {
        let id = self.player_id?;
        self.game
            .current_state()?
            .snake_by_player(id)
            .filter(|snake| snake.alive)
            .map(|snake| snake.direction)
    }

    /// Applies one server packet. `now` is local time in seconds, `wall_ms` is
    /// the Unix clock used for round-trip times.
    pub fn handle_packet(&mut self, packet: Packet, now: f64, wall_ms: u64) {
        match packet {
            Packet::Joined {
                player_id,
                room,
                host,
            } => {
                if self.player_id != Some(player_id) || self.room.as_deref() != Some(room.as_str()) {
                    info!("Joined room {} as player {}", room, player_id);
                }
                if host && !self.is_host {
                    info!("You are the host; press Enter to start");
                }
                self.player_id = Some(player_id);
                self.room = Some(room);
                self.is_host = host;
                self.rejection = None;
            }

            Packet::GameStarted => {
                info!("Game started");
                self.game.reset();
                self.in_game = true;
                self.results = None;
                self.last_ack = None;
            }

            Packet::FullState { state, .. } => {
                self.in_game = state.is_running;
                self.game.apply_full(state, now);
            }

            Packet::CompressedState { compressed, .. } => {
                self.game.apply_compressed(&compressed, now);
            }

            Packet::GameEnded { results } => {
                info!("Game over");
                for result in &results {
                    info!(
                        "#{} {} score={} kills={}",
                        result.rank, result.player_name, result.score, result.kill_count
                    );
                }
                self.in_game = false;
                self.results = Some(results);
            }

            Packet::Pong { timestamp } => {
                self.ping_ms = wall_ms.saturating_sub(timestamp);
            }

            Packet::InputAck { tick, direction } => {
                debug!("Server queued {:?} on tick {}", direction, tick);
                self.last_ack = Some((tick, direction));
            }

            Packet::Rejected { reason } => {
                warn!("Server rejected request: {}", reason);
                self.rejection = Some(reason);
            }

            other => {
                warn!("Unexpected packet from server: {:?}", other);
            }
        }
    }

    pub fn toggle_interpolation(&mut self) {
        self.interpolation_enabled = !self.interpolation_enabled;
        info!("Interpolation: {}", self.interpolation_enabled);
    }
}
