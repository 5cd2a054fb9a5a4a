//! # Snake Arena Server Library
//!
//! Authoritative server for the multiplayer snake arena. Every room runs its
//! own fixed-tick simulation and streams it to its members over UDP.
//!
//! ## Architecture
//!
//! ### One task per room
//! A room is a tokio task that owns its members and, during a game, the
//! [`game::Simulation`]. Commands, simulation ticks and broadcasts share one
//! `select!` loop, so a room's state is only ever touched from that task and
//! rooms run independently of each other.
//!
//! ### Snapshot broadcasting
//! At a fixed rate each room sends either the full game state or a compressed
//! snapshot (heads, lengths and scalars only). The [`broadcast`] scheduler
//! makes every Nth broadcast a full one so client-side reconstruction errors
//! cannot pile up. When the game ends it sends the results once and stops.
//!
//! ### UDP front end
//! The [`network`] module decodes datagrams, maps addresses to players via the
//! [`client_manager`], answers pings and routes everything else to the right
//! room. Silent clients are timed out and removed from their room.
//!
//! ## Module Organization
//!
//! - `game`: movement, collisions, power-ups, death and respawn
//! - `spawning`: free-cell search for snakes, food and power-ups
//! - `broadcast`: full/compressed cadence and end-of-game results
//! - `results`: standings and the [`results::ResultRecorder`] hook
//! - `room`: the per-room task and its lifecycle
//! - `client_manager`: connected players and their rooms
//! - `network`: the UDP server
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::config::{GameConfig, NetworkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         GameConfig::default(),
//!         NetworkConfig::default(),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod error;
pub mod game;
pub mod network;
pub mod results;
pub mod room;
pub mod spawning;
