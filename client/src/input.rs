//! Keyboard sampling and turn filtering

use macroquad::prelude::*;
use shared::Direction;

/// Discrete things the player asked for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Turn(Direction),
    TogglePause,
    StartGame,
    ToggleInterpolation,
}

/// Maps a movement key (arrows or WASD) to a direction
pub fn key_direction(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::Up | KeyCode::W => Some(Direction::Up),
        KeyCode::Down | KeyCode::S => Some(Direction::Down),
        KeyCode::Left | KeyCode::A => Some(Direction::Left),
        KeyCode::Right | KeyCode::D => Some(Direction::Right),
        _ => None,
    }
}

/// Returns the turn worth sending, or `None` if it would reverse the snake
/// or keep it on its current heading.
pub fn resolve_direction(current: Option<Direction>, requested: Direction) -> Option<Direction> {
    match current {
        Some(dir) if dir == requested || dir.is_opposite(requested) => None,
        _ => Some(requested),
    }
}

const MOVEMENT_KEYS: [KeyCode; 8] = [
    KeyCode::Up,
    KeyCode::W,
    KeyCode::Down,
    KeyCode::S,
    KeyCode::Left,
    KeyCode::A,
    KeyCode::Right,
    KeyCode::D,
];

#[derive(Default)]
pub struct InputManager {
    // Previous frame key states for edge detection
    prev_pause: bool,
    prev_start: bool,
    prev_interpolation: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the keyboard. `current` is the authoritative heading of the
    /// local snake, if it is alive.
    pub fn update(&mut self, current: Option<Direction>) -> Vec<InputAction> {
        let mut actions = Vec::new();

        let pressed = MOVEMENT_KEYS
            .iter()
            .filter(|&&key| is_key_pressed(key))
            .find_map(|&key| key_direction(key));

        if let Some(requested) = pressed {
            if let Some(turn) = resolve_direction(current, requested) {
                actions.push(InputAction::Turn(turn));
            }
        }

        let pause = is_key_down(KeyCode::P);
        let start = is_key_down(KeyCode::Enter);
        let interpolation = is_key_down(KeyCode::I);

        if pause && !self.prev_pause {
            actions.push(InputAction::TogglePause);
        }
        if start && !self.prev_start {
            actions.push(InputAction::StartGame);
        }
        if interpolation && !self.prev_interpolation {
            actions.push(InputAction::ToggleInterpolation);
        }

        self.prev_pause = pause;
        self.prev_start = start;
        self.prev_interpolation = interpolation;

        actions
    }
}
