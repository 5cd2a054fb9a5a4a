//! One tokio task per room
//!
//! The task owns the room's members and, while a game is on, its
//! [`Simulation`]. Commands, simulation ticks and broadcasts are multiplexed in
//! a single `select!` loop, so ticks of one room never overlap and no other
//! task ever touches the game state. Dropping the [`RoomHandle`] closes the
//! command channel; the loop exits on the next poll and neither timer fires
//! again.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::config::{GameConfig, NetworkConfig};
use shared::{get_timestamp, player_color, Direction, Packet, PLAYER_COLORS};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::broadcast::BroadcastScheduler;
use crate::game::{Participant, Simulation};
use crate::network::GameMessage;
use crate::results::ResultRecorder;

#[derive(Debug, Clone, PartialEq)]
pub enum RoomCommand {
    Join {
        player_id: u32,
        name: String,
        addr: SocketAddr,
    },
    Leave {
        player_id: u32,
    },
    Start {
        player_id: u32,
    },
    Input {
        player_id: u32,
        direction: Direction,
    },
    TogglePause {
        player_id: u32,
    },
}

/// Owning handle of a running room task
pub struct RoomHandle {
    pub code: String,
    commands: mpsc::UnboundedSender<RoomCommand>,
    task: JoinHandle<()>,
}

impl RoomHandle {
    pub fn spawn(
        code: String,
        game_config: GameConfig,
        network_config: NetworkConfig,
        outbound: mpsc::UnboundedSender<GameMessage>,
        recorder: Arc<dyn ResultRecorder>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let room = Room {
            code: code.clone(),
            game_config,
            network_config,
            members: Vec::new(),
            host: None,
            game: None,
            outbound,
            recorder,
        };

        info!("Room {} created", code);
        let task = tokio::spawn(room.run(receiver));
        Self {
            code,
            commands,
            task,
        }
    }

    /// Queues a command; false if the room task is gone
    pub fn send(&self, command: RoomCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Tears the room down and waits until its task has exited
    pub async fn close(self) {
        let RoomHandle { code, commands, task } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!("Room {} task failed: {}", code, e);
        }
    }
}

#[derive(Debug, Clone)]
struct Member {
    player_id: u32,
    name: String,
    addr: SocketAddr,
    color: String,
}

struct ActiveGame {
    simulation: Simulation,
    scheduler: BroadcastScheduler,
}

struct Room {
    code: String,
    game_config: GameConfig,
    network_config: NetworkConfig,
    /// Join order; the host is always a member
    members: Vec<Member>,
    host: Option<u32>,
    game: Option<ActiveGame>,
    outbound: mpsc::UnboundedSender<GameMessage>,
    recorder: Arc<dyn ResultRecorder>,
}

impl Room {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<RoomCommand>) {
        let mut tick_timer = interval(self.game_config.tick_interval());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut broadcast_timer = interval(self.network_config.broadcast_interval());
        broadcast_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let in_game = self.game.is_some();

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },

                _ = tick_timer.tick(), if in_game => {
                    if let Some(game) = self.game.as_mut() {
                        game.simulation.tick(get_timestamp());
                    }
                },

                _ = broadcast_timer.tick(), if in_game => self.broadcast(),
            }
        }

        info!("Room {} closed", self.code);
    }

    fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                player_id,
                name,
                addr,
            } => self.join(player_id, name, addr),

            RoomCommand::Leave { player_id } => self.leave(player_id),

            RoomCommand::Start { player_id } => self.start(player_id),

            RoomCommand::Input {
                player_id,
                direction,
            } => {
                let accepted = match self.game.as_mut() {
                    Some(game) => match game.simulation.queue_input(player_id, direction) {
                        Ok(()) => Some(game.simulation.state().tick),
                        Err(e) => {
                            debug!("Room {}: ignored input: {}", self.code, e);
                            None
                        }
                    },
                    None => None,
                };

                let member = self.members.iter().find(|m| m.player_id == player_id);
                if let (Some(tick), Some(member)) = (accepted, member) {
                    self.send_to(member.addr, Packet::InputAck { tick, direction });
                }
            }

            RoomCommand::TogglePause { player_id } => {
                if let Some(game) = self.game.as_mut() {
                    if let Some(paused) = game.simulation.toggle_pause(player_id) {
                        debug!("Room {}: player {} paused={}", self.code, player_id, paused);
                    }
                }
            }
        }
    }

    fn join(&mut self, player_id: u32, name: String, addr: SocketAddr) {
        if self.members.iter().any(|m| m.player_id == player_id) {
            return;
        }

        let color = self.free_color();
        let member = Member {
            player_id,
            name,
            addr,
            color,
        };
        let is_host = self.host.is_none();
        if is_host {
            self.host = Some(player_id);
        }

        info!(
            "Room {}: {} joined ({} members)",
            self.code,
            member.name,
            self.members.len() + 1
        );
        self.send_to(
            addr,
            Packet::Joined {
                player_id,
                room: self.code.clone(),
                host: is_host,
            },
        );

        if let Some(game) = self.game.as_mut() {
            let participant = Participant::new(player_id, &member.name, &member.color);
            game.simulation.add_player(&participant, get_timestamp());

            let baseline = Packet::FullState {
                state: game.simulation.state().clone(),
                timestamp: get_timestamp(),
            };
            self.send_to(addr, Packet::GameStarted);
            self.send_to(addr, baseline);
        }

        self.members.push(member);
    }

    fn leave(&mut self, player_id: u32) {
        let Some(index) = self.members.iter().position(|m| m.player_id == player_id) else {
            return;
        };
        let member = self.members.remove(index);
        info!("Room {}: {} left", self.code, member.name);

        if let Some(game) = self.game.as_mut() {
            game.simulation.remove_player(player_id);
        }

        if self.host == Some(player_id) {
            self.host = self.members.first().map(|m| m.player_id);
            if let Some(new_host) = self.members.first() {
                info!("Room {}: {} is now host", self.code, new_host.name);
                self.send_to(
                    new_host.addr,
                    Packet::Joined {
                        player_id: new_host.player_id,
                        room: self.code.clone(),
                        host: true,
                    },
                );
            }
        }
    }

    fn start(&mut self, player_id: u32) {
        if self.host != Some(player_id) {
            debug!("Room {}: start request from non-host {}", self.code, player_id);
            return;
        }
        if self.game.is_some() {
            return;
        }

        let participants: Vec<Participant> = self
            .members
            .iter()
            .map(|m| Participant::new(m.player_id, &m.name, &m.color))
            .collect();

        let simulation = Simulation::new(
            self.game_config.clone(),
            &participants,
            get_timestamp(),
            StdRng::from_entropy(),
        );
        self.game = Some(ActiveGame {
            simulation,
            scheduler: BroadcastScheduler::new(self.network_config.full_sync_every),
        });

        info!("Room {}: game started", self.code);
        self.multicast(Packet::GameStarted);
    }

    fn broadcast(&mut self) {
        let now = get_timestamp();
        let (packet, finished) = match self.game.as_mut() {
            Some(game) => (
                game.scheduler.next_packet(game.simulation.state(), now),
                game.scheduler.is_finished(),
            ),
            None => return,
        };

        if let Some(packet) = packet {
            if let Packet::GameEnded { results } = &packet {
                let recorder = Arc::clone(&self.recorder);
                let room = self.code.clone();
                let results = results.clone();
                // Fire and forget; the room does not wait for persistence.
                tokio::task::spawn_blocking(move || recorder.record(&room, &results));
            }
            self.multicast(packet);
        }

        if finished {
            info!("Room {}: back to waiting", self.code);
            self.game = None;
        }
    }

    fn free_color(&self) -> String {
        PLAYER_COLORS
            .iter()
            .find(|color| !self.members.iter().any(|m| m.color == **color))
            .map(|color| color.to_string())
            .unwrap_or_else(|| player_color(self.members.len()).to_string())
    }

    fn send_to(&self, addr: SocketAddr, packet: Packet) {
        if self
            .outbound
            .send(GameMessage::SendPacket { packet, addr })
            .is_err()
        {
            warn!("Room {}: outbound queue closed", self.code);
        }
    }

    fn multicast(&self, packet: Packet) {
        let addrs = self.members.iter().map(|m| m.addr).collect();
        if self
            .outbound
            .send(GameMessage::Multicast { packet, addrs })
            .is_err()
        {
            warn!("Room {}: outbound queue closed", self.code);
        }
    }
}
