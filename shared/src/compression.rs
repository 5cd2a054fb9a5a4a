//! Compact snapshot encoding and reconstruction
//!
//! A compressed snapshot carries only the head, direction and length of each
//! snake plus its scalar fields. The receiver rebuilds bodies from the
//! previously reconstructed state: the previous body gets the new head
//! prepended and is trimmed or padded to the signaled length.
//!
//! When no previous snake with the same identity is known (first contact,
//! a new game, or a snake that just died and lost its body) the body is
//! extruded straight back from the head along the signaled direction. This
//! is intentionally lossy: it is exact only for a snake that moved in a
//! straight line, and the periodic full snapshot bounds the resulting drift.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::geometry::extrude_body;
use crate::{
    ActiveEffect, Direction, Food, FoodKind, GameState, Position, PowerUp, PowerUpKind, Snake,
};

/// `(id, x, y, is_super, value)`
pub type CompressedFood = (u32, i32, i32, bool, u32);

/// `(id, kind, x, y, duration, spawn_time, size)`
pub type CompressedPowerUp = (u32, PowerUpKind, i32, i32, u64, u64, u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedSnake {
    pub id: u32,
    pub player_id: u32,
    pub player_name: String,
    pub color: String,
    pub head_x: i32,
    pub head_y: i32,
    pub direction: Direction,
    pub length: u32,
    pub score: u32,
    pub alive: bool,
    pub paused: bool,
    pub effects: Vec<ActiveEffect>,
    pub speed_boost_count: u32,
    pub speed_slow_count: u32,
    pub wall_pass_charges: u32,
    pub invincible_charges: u32,
    pub max_length: u32,
    pub respawn_time: Option<u64>,
    pub spawn_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedGameState {
    #[serde(rename = "t")]
    pub tick: u32,
    #[serde(rename = "ts")]
    pub timestamp: u64,
    #[serde(rename = "s")]
    pub snakes: Vec<CompressedSnake>,
    #[serde(rename = "f")]
    pub foods: Vec<CompressedFood>,
    #[serde(rename = "p")]
    pub power_ups: Vec<CompressedPowerUp>,
    #[serde(rename = "r")]
    pub is_running: bool,
    /// Omitted when the message log is empty
    #[serde(rename = "m")]
    pub messages: Option<Vec<String>>,
}

pub fn compress_snake(snake: &Snake) -> CompressedSnake {
    let head = snake.head().unwrap_or_default();

    CompressedSnake {
        id: snake.id,
        player_id: snake.player_id,
        player_name: snake.player_name.clone(),
        color: snake.color.clone(),
        head_x: head.x,
        head_y: head.y,
        direction: snake.direction,
        length: snake.segments.len() as u32,
        score: snake.score,
        alive: snake.alive,
        paused: snake.paused,
        effects: snake.effects.clone(),
        speed_boost_count: snake.speed_boost_count,
        speed_slow_count: snake.speed_slow_count,
        wall_pass_charges: snake.wall_pass_charges,
        invincible_charges: snake.invincible_charges,
        max_length: snake.max_length,
        respawn_time: snake.respawn_time,
        spawn_time: snake.spawn_time,
    }
}

/// Rebuilds a full snake; `previous` must be the last reconstructed snake for this player
pub fn decompress_snake(compressed: &CompressedSnake, previous: Option<&Snake>) -> Snake {
    let head = Position::new(compressed.head_x, compressed.head_y);
    let length = compressed.length as usize;

    let usable_previous = previous.filter(|prev| {
        prev.player_id == compressed.player_id && prev.id == compressed.id && !prev.is_empty()
    });

    let segments = if length == 0 {
        Vec::new()
    } else {
        match usable_previous {
            Some(prev) => rebuild_from_previous(&prev.segments, head, length),
            None => extrude_body(head, compressed.direction, length),
        }
    };

    Snake {
        id: compressed.id,
        player_id: compressed.player_id,
        player_name: compressed.player_name.clone(),
        segments,
        direction: compressed.direction,
        pending_direction: None,
        alive: compressed.alive,
        paused: compressed.paused,
        color: compressed.color.clone(),
        score: compressed.score,
        effects: compressed.effects.clone(),
        speed_boost_count: compressed.speed_boost_count,
        speed_slow_count: compressed.speed_slow_count,
        wall_pass_charges: compressed.wall_pass_charges,
        invincible_charges: compressed.invincible_charges,
        max_length: compressed.max_length,
        respawn_time: compressed.respawn_time,
        spawn_time: compressed.spawn_time,
        kills: previous.map(|p| p.kills).unwrap_or(0),
        joined_at: previous.map(|p| p.joined_at).unwrap_or(0),
    }
}

fn rebuild_from_previous(previous: &[Position], head: Position, length: usize) -> Vec<Position> {
    let mut segments = Vec::with_capacity(length.max(previous.len() + 1));

    // A snake that did not move (paused) keeps its body as-is.
    if previous.first() != Some(&head) {
        segments.push(head);
    }
    segments.extend_from_slice(previous);

    segments.truncate(length);
    while segments.len() < length {
        let tail = segments.last().copied().unwrap_or(head);
        segments.push(tail);
    }
    segments
}

pub fn compress_game_state(state: &GameState, timestamp: u64) -> CompressedGameState {
    CompressedGameState {
        tick: state.tick,
        timestamp,
        snakes: state.snakes.iter().map(compress_snake).collect(),
        foods: state
            .foods
            .iter()
            .map(|f| {
                (
                    f.id,
                    f.position.x,
                    f.position.y,
                    f.kind == FoodKind::Super,
                    f.value,
                )
            })
            .collect(),
        power_ups: state
            .power_ups
            .iter()
            .map(|p| {
                (
                    p.id,
                    p.kind,
                    p.position.x,
                    p.position.y,
                    p.duration,
                    p.spawn_time,
                    p.size.max(1),
                )
            })
            .collect(),
        is_running: state.is_running,
        messages: if state.messages.is_empty() {
            None
        } else {
            Some(state.messages.iter().cloned().collect())
        },
    }
}

/// Reconstructs a full state. Pure: the same inputs always give the same output.
pub fn decompress_game_state(
    compressed: &CompressedGameState,
    previous: Option<&GameState>,
) -> GameState {
    let snakes = compressed
        .snakes
        .iter()
        .map(|cs| {
            let prev = previous.and_then(|state| state.snake_by_player(cs.player_id));
            decompress_snake(cs, prev)
        })
        .collect();

    let foods = compressed
        .foods
        .iter()
        .map(|&(id, x, y, is_super, value)| Food {
            id,
            position: Position::new(x, y),
            kind: if is_super {
                FoodKind::Super
            } else {
                FoodKind::Normal
            },
            value,
        })
        .collect();

    let power_ups = compressed
        .power_ups
        .iter()
        .map(|&(id, kind, x, y, duration, spawn_time, size)| PowerUp {
            id,
            kind,
            position: Position::new(x, y),
            duration,
            spawn_time,
            size,
        })
        .collect();

    let messages: VecDeque<String> = match (&compressed.messages, previous) {
        (Some(messages), _) => messages.iter().cloned().collect(),
        (None, Some(prev)) => prev.messages.clone(),
        (None, None) => VecDeque::new(),
    };

    GameState {
        tick: compressed.tick,
        snakes,
        foods,
        power_ups,
        is_running: compressed.is_running,
        start_time: previous
            .map(|prev| prev.start_time)
            .unwrap_or(compressed.timestamp),
        messages,
    }
}
