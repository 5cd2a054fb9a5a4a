//! Types and protocol shared by the snake arena server and client
//!
//! The server runs one authoritative simulation per room and broadcasts it as
//! either a full [`GameState`] or a [`compression::CompressedGameState`]. The
//! client rebuilds full states from compressed ones with the same module.

pub mod compression;
pub mod config;
pub mod error;
pub mod geometry;
mod model;
mod utils;

pub use model::*;
pub use utils::get_timestamp;

use serde::{Deserialize, Serialize};

use crate::compression::CompressedGameState;
use crate::error::ProtocolError;

/// Capacity of the public message log carried in every snapshot
pub const MESSAGE_CAPACITY: usize = 5;

pub const NORMAL_FOOD_VALUE: u32 = 10;
pub const SUPER_FOOD_VALUE: u32 = 30;
pub const POWER_UP_SCORE: u32 = 5;

/// Snapshots further apart than this many ticks are rendered without interpolation
pub const INTERPOLATION_MAX_TICK_GAP: u32 = 5;
/// A snake whose segment count changed by more than this is rendered without interpolation
pub const INTERPOLATION_MAX_LENGTH_DELTA: usize = 2;

/// Largest datagram either side will send
pub const MAX_DATAGRAM_SIZE: usize = 65_000;

pub const DEFAULT_ROOM: &str = "LOBBY";
pub const MAX_NAME_LEN: usize = 12;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_ROOM_CODE_LEN: usize = 20;

pub const PLAYER_COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client -> server
    Join {
        name: String,
        room: String,
    },
    StartGame,
    Input {
        direction: Direction,
        timestamp: u64,
    },
    TogglePause,
    Leave,
    Ping {
        timestamp: u64,
    },

    // Server -> client
    Joined {
        player_id: u32,
        room: String,
        host: bool,
    },
    GameStarted,
    /// Sent to the sender once an input is queued; `tick` is the tick it was queued on
    InputAck {
        tick: u32,
        direction: Direction,
    },
    FullState {
        state: GameState,
        timestamp: u64,
    },
    CompressedState {
        compressed: CompressedGameState,
        timestamp: u64,
    },
    GameEnded {
        results: Vec<GameResult>,
    },
    Pong {
        timestamp: u64,
    },
    Rejected {
        reason: String,
    },
}

pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    let bytes = bincode::serialize(packet).map_err(ProtocolError::Encode)?;
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::TooLarge {
            size: bytes.len(),
            limit: MAX_DATAGRAM_SIZE,
        });
    }
    Ok(bytes)
}

pub fn decode_packet(bytes: &[u8]) -> Result<Packet, ProtocolError> {
    bincode::deserialize(bytes).map_err(ProtocolError::Decode)
}

/// Trims and truncates a display name; `None` if it ends up too short
pub fn normalize_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    (name.chars().count() >= MIN_NAME_LEN).then_some(name)
}

/// Upper-cases and truncates a room code, defaulting to the lobby
pub fn normalize_room_code(raw: &str) -> String {
    let code: String = raw
        .trim()
        .chars()
        .take(MAX_ROOM_CODE_LEN)
        .collect::<String>()
        .to_uppercase();
    if code.is_empty() {
        DEFAULT_ROOM.to_string()
    } else {
        code
    }
}

pub fn player_color(index: usize) -> &'static str {
    PLAYER_COLORS[index % PLAYER_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::compress_game_state;

    #[test]
    fn test_packet_serialization_input() {
        let packet = Packet::Input {
            direction: Direction::Left,
            timestamp: 456789,
        };

        let bytes = encode_packet(&packet).unwrap();
        match decode_packet(&bytes).unwrap() {
            Packet::Input {
                direction,
                timestamp,
            } => {
                assert_eq!(direction, Direction::Left);
                assert_eq!(timestamp, 456789);
            }
            other => panic!("Wrong packet type after deserialization: {:?}", other),
        }
    }

    #[test]
    fn test_packet_serialization_compressed_state() {
        let mut state = GameState::new(10);
        state.tick = 42;
        state.snakes.push(Snake::new(
            1,
            1,
            "alice",
            player_color(0),
            vec![Position::new(3, 3), Position::new(2, 3)],
            Direction::Right,
            10,
        ));

        let packet = Packet::CompressedState {
            compressed: compress_game_state(&state, 99),
            timestamp: 99,
        };
        let decoded = decode_packet(&encode_packet(&packet).unwrap()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_packet(&[0xff, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  alice  "), Some("alice".to_string()));
        assert_eq!(
            normalize_name("a_really_long_player_name"),
            Some("a_really_lon".to_string())
        );
        assert_eq!(normalize_name(" x "), None);
        assert_eq!(normalize_name(""), None);
    }

    #[test]
    fn test_normalize_room_code() {
        assert_eq!(normalize_room_code(" abc "), "ABC");
        assert_eq!(normalize_room_code(""), DEFAULT_ROOM);
        assert_eq!(normalize_room_code(&"r".repeat(30)).len(), MAX_ROOM_CODE_LEN);
    }

    #[test]
    fn test_player_color_cycles() {
        assert_eq!(player_color(0), "#FF6B6B");
        assert_eq!(player_color(8), player_color(0));
    }
}
