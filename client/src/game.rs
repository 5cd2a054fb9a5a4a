//! Snapshot reconciliation and render-time interpolation
//!
//! The client keeps exactly two snapshots, the previous and the current one,
//! each stamped with its local receipt time. Compressed snapshots are rebuilt
//! against the current one before they replace it. Rendering blends the two
//! according to how much of the expected inter-snapshot interval has elapsed.

use log::debug;
use shared::compression::{decompress_game_state, CompressedGameState};
use shared::geometry::manhattan_distance;
use shared::{
    Food, GameState, Position, PowerUp, Snake, INTERPOLATION_MAX_LENGTH_DELTA,
    INTERPOLATION_MAX_TICK_GAP,
};

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: GameState,
    /// Local receipt time in seconds
    pub received_at: f64,
    pub tick: u32,
}

impl Snapshot {
    fn new(state: GameState, received_at: f64) -> Self {
        let tick = state.tick;
        Self {
            state,
            received_at,
            tick,
        }
    }
}

/// A snake as drawn this frame, in fractional cell coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnake {
    pub player_id: u32,
    pub name: String,
    pub color: String,
    pub segments: Vec<(f32, f32)>,
    pub alive: bool,
    pub paused: bool,
    pub score: u32,
    pub wall_pass_charges: u32,
    pub invincible_charges: u32,
    pub respawn_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub tick: u32,
    pub is_running: bool,
    pub snakes: Vec<RenderSnake>,
    pub foods: Vec<Food>,
    pub power_ups: Vec<PowerUp>,
    pub messages: Vec<String>,
}

pub struct ClientGameState {
    previous: Option<Snapshot>,
    current: Option<Snapshot>,
    /// Nominal server tick interval in milliseconds
    tick_interval_ms: f64,
}

impl ClientGameState {
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            previous: None,
            current: None,
            tick_interval_ms: tick_interval_ms.max(1) as f64,
        }
    }

    /// Forgets both snapshots, e.g. when a new game starts
    pub fn reset(&mut self) {
        self.previous = None;
        self.current = None;
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn current_state(&self) -> Option<&GameState> {
        self.current.as_ref().map(|s| &s.state)
    }

    /// Installs a full snapshot. Returns false if it is an out-of-order copy of
    /// an older tick of the same game.
    pub fn apply_full(&mut self, state: GameState, received_at: f64) -> bool {
        if let Some(current) = &self.current {
            if current.state.start_time == state.start_time && state.tick < current.tick {
                debug!("Dropping stale full snapshot {} < {}", state.tick, current.tick);
                return false;
            }
        }
        self.push(Snapshot::new(state, received_at));
        true
    }

    /// Rebuilds a compressed snapshot against the current state and installs it.
    /// Snapshots that are not newer than the current one are dropped.
    pub fn apply_compressed(&mut self, compressed: &CompressedGameState, received_at: f64) -> bool {
        if let Some(current) = &self.current {
            if compressed.tick <= current.tick {
                debug!(
                    "Dropping stale compressed snapshot {} <= {}",
                    compressed.tick, current.tick
                );
                return false;
            }
        }

        let state = decompress_game_state(compressed, self.current_state());
        self.push(Snapshot::new(state, received_at));
        true
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.previous = self.current.take();
        self.current = Some(snapshot);
    }

    /// Fraction of the expected inter-snapshot interval elapsed since the current
    /// snapshot arrived, clamped to `[0, 1]`
    pub fn interpolation_factor(&self, now: f64) -> f32 {
        let Some(current) = &self.current else {
            return 0.0;
        };

        let tick_delta = self
            .previous
            .as_ref()
            .map(|prev| i64::from(current.tick) - i64::from(prev.tick))
            .unwrap_or(0);
        let expected_ms = if tick_delta > 0 {
            tick_delta as f64 * self.tick_interval_ms
        } else {
            self.tick_interval_ms
        };

        let elapsed_ms = (now - current.received_at) * 1000.0;
        (elapsed_ms / expected_ms).clamp(0.0, 1.0) as f32
    }

    /// State to draw at `now`; `None` until the first snapshot arrives
    pub fn render_state(&self, now: f64, interpolate: bool) -> Option<RenderState> {
        let current = self.current.as_ref()?;

        let previous = self.previous.as_ref().filter(|prev| {
            interpolate
                && current.tick >= prev.tick
                && current.tick - prev.tick <= INTERPOLATION_MAX_TICK_GAP
        });
        let t = self.interpolation_factor(now);

        let snakes = current
            .state
            .snakes
            .iter()
            .map(|snake| {
                let before = previous.and_then(|prev| prev.state.snake_by_player(snake.player_id));
                render_snake(before, snake, t)
            })
            .collect();

        Some(RenderState {
            tick: current.tick,
            is_running: current.state.is_running,
            snakes,
            foods: current.state.foods.clone(),
            power_ups: current.state.power_ups.clone(),
            messages: current.state.messages.iter().cloned().collect(),
        })
    }
}

fn cell(position: Position) -> (f32, f32) {
    (position.x as f32, position.y as f32)
}

fn lerp(a: Position, b: Position, t: f32) -> (f32, f32) {
    (
        a.x as f32 + (b.x - a.x) as f32 * t,
        a.y as f32 + (b.y - a.y) as f32 * t,
    )
}

/// True if blending the two versions of a snake would draw garbage
fn should_snap(before: &Snake, after: &Snake) -> bool {
    let length_delta = before.len().abs_diff(after.len());
    !before.alive
        || !after.alive
        || before.spawn_time != after.spawn_time
        || length_delta > INTERPOLATION_MAX_LENGTH_DELTA
}

fn render_snake(before: Option<&Snake>, after: &Snake, t: f32) -> RenderSnake {
    let segments = match before {
        Some(before) if !should_snap(before, after) => after
            .segments
            .iter()
            .enumerate()
            .map(|(i, &to)| match before.segments.get(i) {
                // Wall-pass crossings jump across the grid.
                Some(&from) if manhattan_distance(from, to) <= 1 => lerp(from, to, t),
                _ => cell(to),
            })
            .collect(),
        _ => after.segments.iter().copied().map(cell).collect(),
    };

    RenderSnake {
        player_id: after.player_id,
        name: after.player_name.clone(),
        color: after.color.clone(),
        segments,
        alive: after.alive,
        paused: after.paused,
        score: after.score,
        wall_pass_charges: after.wall_pass_charges,
        invincible_charges: after.invincible_charges,
        respawn_time: after.respawn_time,
    }
}
