//! # Snake Arena Client Library
//!
//! Client side of the multiplayer snake arena: a UDP connection to the
//! authoritative server, reconstruction of the snapshots it streams, smoothing
//! between them and a macroquad front end.
//!
//! ## Architecture Overview
//!
//! The server owns the simulation. The client only sends intents (join, turn,
//! pause, start) and draws what it is told, so there is no local prediction.
//!
//! ### Snapshot Reconstruction
//! Most snapshots arrive compressed: each snake is reduced to its head, length
//! and scalars. [`game::ClientGameState`] rebuilds full bodies against the last
//! known state and drops snapshots that arrive out of order. Periodic full
//! snapshots replace whatever the reconstruction has drifted to.
//!
//! ### Interpolation
//! The previous and current snapshots are blended by the fraction of the
//! expected inter-snapshot interval that has elapsed. Snakes that died,
//! respawned, grew by more than a couple of cells or wrapped around the grid
//! are drawn at their current position instead.
//!
//! ## Module Organization
//!
//! - `game`: snapshot buffer, reconstruction and interpolation
//! - `input`: keyboard sampling and turn filtering
//! - `network`: background socket thread and the per-session packet handler
//! - `rendering`: grid, snakes, pickups and the HUD
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Connection, Session};
//! use shared::{get_timestamp, Packet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = Connection::open("127.0.0.1:8080", 0)?;
//! connection.send(Packet::Join { name: "alice".into(), room: "".into() });
//!
//! let mut session = Session::new(50);
//! for packet in connection.poll() {
//!     session.handle_packet(packet, 0.0, get_timestamp());
//! }
//! let frame = session.game.render_state(0.0, session.interpolation_enabled);
//! # let _ = frame;
//! connection.close();
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
