//! Server network layer: UDP I/O, connection bookkeeping and room routing
//!
//! Rooms run as their own tasks (see [`crate::room`]). This layer decodes
//! datagrams, maps addresses to players, forwards commands to the right room
//! and pushes everything the rooms emit back out through the socket.

use crate::client_manager::ClientManager;
use crate::results::{LogRecorder, ResultRecorder};
use crate::room::{RoomCommand, RoomHandle};
use log::{debug, error, info, warn};
use shared::config::{GameConfig, NetworkConfig};
use shared::{
    decode_packet, encode_packet, normalize_name, normalize_room_code, Packet, MAX_DATAGRAM_SIZE,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32, room: String },
    Shutdown,
}

/// Messages sent from rooms to the network sender
#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    Multicast {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    rooms: HashMap<String, RoomHandle>,
    game_config: GameConfig,
    network_config: NetworkConfig,
    recorder: Arc<dyn ResultRecorder>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    pub async fn new(
        addr: &str,
        game_config: GameConfig,
        network_config: NetworkConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        let clients = ClientManager::new(network_config.max_clients, network_config.client_timeout);

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(clients)),
            rooms: HashMap::new(),
            game_config,
            network_config,
            recorder: Arc::new(LogRecorder),
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    /// Replaces the default logging recorder
    pub fn with_recorder(mut self, recorder: Arc<dyn ResultRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sender that makes [`Server::run`] return when given [`ServerMessage::Shutdown`]
    pub fn control(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match decode_packet(&buffer[..len]) {
                        Ok(packet) => {
                            if server_tx
                                .send(ServerMessage::PacketReceived { packet, addr })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping datagram from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing queue fed by the rooms
    fn spawn_network_sender(&mut self) {
        let Some(mut game_rx) = self.game_rx.take() else {
            return;
        };
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        Self::send_packet_impl(&socket, &packet, &[addr]).await;
                    }
                    GameMessage::Multicast { packet, addrs } => {
                        Self::send_packet_impl(&socket, &packet, &addrs).await;
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for (client_id, room) in timed_out {
                    if server_tx
                        .send(ServerMessage::ClientTimeout { client_id, room })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    /// Encodes once and sends to every address
    async fn send_packet_impl(socket: &UdpSocket, packet: &Packet, addrs: &[SocketAddr]) {
        let data = match encode_packet(packet) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode packet: {}", e);
                return;
            }
        };

        for addr in addrs {
            if let Err(e) = socket.send_to(&data, *addr).await {
                error!("Failed to send packet to {}: {}", addr, e);
            }
        }
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn reject(&self, addr: SocketAddr, reason: &str) {
        info!("Rejecting {}: {}", addr, reason);
        self.send_packet(
            Packet::Rejected {
                reason: reason.to_string(),
            },
            addr,
        );
    }

    /// Forwards a command to the room of the client at `addr`
    async fn route(&mut self, addr: SocketAddr, command: impl FnOnce(u32) -> RoomCommand) {
        let known = {
            let mut clients = self.clients.write().await;
            clients.touch(addr)
        };

        match known {
            Some((client_id, room)) => {
                if let Some(handle) = self.rooms.get(&room) {
                    handle.send(command(client_id));
                }
            }
            None => debug!("Packet from unknown address {}", addr),
        }
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Join { name, room } => self.handle_join(addr, &name, &room).await,

            Packet::StartGame => {
                self.route(addr, |player_id| RoomCommand::Start { player_id })
                    .await
            }

            Packet::Input { direction, .. } => {
                self.route(addr, |player_id| RoomCommand::Input {
                    player_id,
                    direction,
                })
                .await
            }

            Packet::TogglePause => {
                self.route(addr, |player_id| RoomCommand::TogglePause { player_id })
                    .await
            }

            Packet::Leave => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                if let Some(client_id) = client_id {
                    self.disconnect(client_id).await;
                }
            }

            Packet::Ping { timestamp } => {
                {
                    let mut clients = self.clients.write().await;
                    clients.touch(addr);
                }
                self.send_packet(Packet::Pong { timestamp }, addr);
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    async fn handle_join(&mut self, addr: SocketAddr, raw_name: &str, raw_room: &str) {
        let Some(name) = normalize_name(raw_name) else {
            self.reject(addr, "Name must be at least 2 characters");
            return;
        };
        let room = normalize_room_code(raw_room);

        // A client joining again from the same address leaves its old room first.
        let existing = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };
        if let Some(existing_id) = existing {
            info!("Replacing existing client {} from {}", existing_id, addr);
            self.disconnect(existing_id).await;
        }

        let members = {
            let clients = self.clients.read().await;
            clients.count_in_room(&room)
        };
        if members >= self.game_config.max_players {
            self.reject(addr, "Room is full");
            return;
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr, name.clone(), room.clone())
        };
        let Some(player_id) = client_id else {
            self.reject(addr, "Server full");
            return;
        };

        let handle = self.rooms.entry(room.clone()).or_insert_with(|| {
            RoomHandle::spawn(
                room,
                self.game_config.clone(),
                self.network_config.clone(),
                self.game_tx.clone(),
                Arc::clone(&self.recorder),
            )
        });
        handle.send(RoomCommand::Join {
            player_id,
            name,
            addr,
        });
    }

    async fn disconnect(&mut self, client_id: u32) {
        let removed = {
            let mut clients = self.clients.write().await;
            clients.remove_client(&client_id)
        };
        if let Some(client) = removed {
            self.leave_room(client.id, &client.room).await;
        }
    }

    /// Removes the player from its room and tears the room down once it is empty
    async fn leave_room(&mut self, client_id: u32, room: &str) {
        if let Some(handle) = self.rooms.get(room) {
            handle.send(RoomCommand::Leave {
                player_id: client_id,
            });
        }

        let remaining = {
            let clients = self.clients.read().await;
            clients.count_in_room(room)
        };
        if remaining == 0 {
            if let Some(handle) = self.rooms.remove(room) {
                handle.close().await;
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Main server loop
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ClientTimeout { client_id, room } => {
                    info!("Client {} timed out", client_id);
                    self.leave_room(client_id, &room).await;
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        for (_, handle) in self.rooms.drain() {
            handle.close().await;
        }
        Ok(())
    }
}
