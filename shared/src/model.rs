//! Authoritative game data model shared by the server simulation and the client decoder

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::MESSAGE_CAPACITY;

/// Integer grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell one step towards `direction` (no bounds handling)
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.vector();
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit grid vector; y grows downwards
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Normal,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    pub id: u32,
    pub position: Position,
    pub kind: FoodKind,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    SpeedBoost,
    SpeedSlow,
    WallPass,
    Invincible,
    ShrinkOpponent,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::SpeedSlow,
        PowerUpKind::WallPass,
        PowerUpKind::Invincible,
        PowerUpKind::ShrinkOpponent,
    ];

    /// Nominal effect duration advertised with the pickup, in milliseconds
    pub fn duration_ms(self) -> u64 {
        match self {
            PowerUpKind::SpeedBoost | PowerUpKind::SpeedSlow | PowerUpKind::Invincible => 5000,
            PowerUpKind::WallPass => 8000,
            PowerUpKind::ShrinkOpponent => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::SpeedBoost => "speed boost",
            PowerUpKind::SpeedSlow => "speed slow",
            PowerUpKind::WallPass => "wall pass",
            PowerUpKind::Invincible => "invincible",
            PowerUpKind::ShrinkOpponent => "shrink opponent",
        }
    }
}

/// Pickup occupying a `size`×`size` footprint whose top-left cell is `position`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub position: Position,
    pub duration: u64,
    pub spawn_time: u64,
    pub size: u32,
}

impl PowerUp {
    pub fn covers(&self, cell: Position) -> bool {
        let size = self.size.max(1) as i32;
        cell.x >= self.position.x
            && cell.x < self.position.x + size
            && cell.y >= self.position.y
            && cell.y < self.position.y + size
    }

    /// All cells of the footprint, row by row
    pub fn footprint(&self) -> impl Iterator<Item = Position> + '_ {
        let size = self.size.max(1) as i32;
        (0..size).flat_map(move |dy| {
            (0..size).map(move |dx| Position::new(self.position.x + dx, self.position.y + dy))
        })
    }
}

/// Time-bounded effect; expired entries are pruned by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub end_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snake {
    pub id: u32,
    pub player_id: u32,
    pub player_name: String,
    /// Body cells, head first
    pub segments: Vec<Position>,
    pub direction: Direction,
    /// Direction requested since the last tick, applied at the next tick boundary
    #[serde(skip)]
    pub pending_direction: Option<Direction>,
    pub alive: bool,
    pub paused: bool,
    pub color: String,
    pub score: u32,
    pub effects: Vec<ActiveEffect>,
    pub speed_boost_count: u32,
    pub speed_slow_count: u32,
    pub wall_pass_charges: u32,
    pub invincible_charges: u32,
    pub max_length: u32,
    pub respawn_time: Option<u64>,
    pub spawn_time: Option<u64>,
    pub kills: u32,
    pub joined_at: u64,
}

impl Snake {
    pub fn new(
        id: u32,
        player_id: u32,
        player_name: impl Into<String>,
        color: impl Into<String>,
        segments: Vec<Position>,
        direction: Direction,
        now: u64,
    ) -> Self {
        let max_length = segments.len() as u32;
        Self {
            id,
            player_id,
            player_name: player_name.into(),
            segments,
            direction,
            pending_direction: None,
            alive: true,
            paused: false,
            color: color.into(),
            score: 0,
            effects: Vec::new(),
            speed_boost_count: 0,
            speed_slow_count: 0,
            wall_pass_charges: 0,
            invincible_charges: 0,
            max_length,
            respawn_time: None,
            spawn_time: Some(now),
            kills: 0,
            joined_at: now,
        }
    }

    pub fn head(&self) -> Option<Position> {
        self.segments.first().copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True while the post-spawn intangibility window is still open
    pub fn is_spawn_protected(&self, now: u64, window_ms: u64) -> bool {
        self.spawn_time
            .map(|spawned| now < spawned.saturating_add(window_ms))
            .unwrap_or(false)
    }

    /// Spends one invincibility charge; returns false when none is left
    pub fn consume_invincibility(&mut self) -> bool {
        if self.invincible_charges > 0 {
            self.invincible_charges -= 1;
            true
        } else {
            false
        }
    }

    pub fn occupies(&self, cell: Position) -> bool {
        self.segments.contains(&cell)
    }
}

/// Root aggregate of one room's simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub tick: u32,
    pub snakes: Vec<Snake>,
    pub foods: Vec<Food>,
    pub power_ups: Vec<PowerUp>,
    pub is_running: bool,
    pub start_time: u64,
    pub messages: VecDeque<String>,
}

impl GameState {
    pub fn new(start_time: u64) -> Self {
        Self {
            tick: 0,
            snakes: Vec::new(),
            foods: Vec::new(),
            power_ups: Vec::new(),
            is_running: true,
            start_time,
            messages: VecDeque::with_capacity(MESSAGE_CAPACITY),
        }
    }

    /// Appends a public message, dropping the oldest beyond capacity
    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push_back(message.into());
        while self.messages.len() > MESSAGE_CAPACITY {
            self.messages.pop_front();
        }
    }

    pub fn snake_by_player(&self, player_id: u32) -> Option<&Snake> {
        self.snakes.iter().find(|s| s.player_id == player_id)
    }

    pub fn snake_by_player_mut(&mut self, player_id: u32) -> Option<&mut Snake> {
        self.snakes.iter_mut().find(|s| s.player_id == player_id)
    }

    pub fn food_at(&self, cell: Position) -> Option<usize> {
        self.foods.iter().position(|f| f.position == cell)
    }

    pub fn power_up_at(&self, cell: Position) -> Option<usize> {
        self.power_ups.iter().position(|p| p.covers(cell))
    }
}

/// Final standing of one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub player_id: u32,
    pub player_name: String,
    pub score: u32,
    pub rank: u32,
    pub kill_count: u32,
    /// Milliseconds since the player's snake entered the game
    pub survival_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposites() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert!(direction.is_opposite(direction.opposite()));
            assert!(!direction.is_opposite(direction));
        }
    }

    #[test]
    fn test_snake_occupies_its_body_only() {
        let snake = Snake::new(
            1,
            1,
            "alice",
            "#FF6B6B",
            vec![Position::new(3, 3), Position::new(2, 3)],
            Direction::Right,
            0,
        );
        assert!(snake.occupies(Position::new(3, 3)));
        assert!(snake.occupies(Position::new(2, 3)));
        assert!(!snake.occupies(Position::new(4, 3)));
    }

    #[test]
    fn test_position_step() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.step(Direction::Up), Position::new(5, 4));
        assert_eq!(origin.step(Direction::Down), Position::new(5, 6));
        assert_eq!(origin.step(Direction::Left), Position::new(4, 5));
        assert_eq!(origin.step(Direction::Right), Position::new(6, 5));
    }

    #[test]
    fn test_power_up_footprint() {
        let power_up = PowerUp {
            id: 1,
            kind: PowerUpKind::WallPass,
            position: Position::new(10, 10),
            duration: 8000,
            spawn_time: 0,
            size: 2,
        };

        let cells: Vec<Position> = power_up.footprint().collect();
        assert_eq!(cells.len(), 4);
        assert!(power_up.covers(Position::new(11, 11)));
        assert!(power_up.covers(Position::new(10, 11)));
        assert!(!power_up.covers(Position::new(12, 10)));
        assert!(!power_up.covers(Position::new(9, 10)));
    }

    #[test]
    fn test_message_fifo_drops_oldest() {
        let mut state = GameState::new(0);
        for i in 0..(MESSAGE_CAPACITY + 2) {
            state.push_message(format!("message {}", i));
        }

        assert_eq!(state.messages.len(), MESSAGE_CAPACITY);
        assert_eq!(state.messages.front().map(String::as_str), Some("message 2"));
    }

    #[test]
    fn test_spawn_protection_window() {
        let snake = Snake::new(
            1,
            1,
            "alice",
            "#FF6B6B",
            vec![Position::new(3, 3)],
            Direction::Right,
            1_000,
        );

        assert!(snake.is_spawn_protected(1_500, 1_000));
        assert!(!snake.is_spawn_protected(2_000, 1_000));
    }

    #[test]
    fn test_consume_invincibility() {
        let mut snake = Snake::new(1, 1, "bob", "#4ECDC4", vec![], Direction::Left, 0);
        assert!(!snake.consume_invincibility());

        snake.invincible_charges = 1;
        assert!(snake.consume_invincibility());
        assert_eq!(snake.invincible_charges, 0);
    }
}
