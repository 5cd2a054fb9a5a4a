//! Tunables for the simulation and the broadcast loop

use std::time::Duration;

/// Simulation parameters for one room
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    pub tick_interval_ms: u64,
    pub initial_snake_length: usize,
    pub initial_foods: usize,
    /// Probability of spawning one food per tick
    pub food_spawn_rate: f64,
    pub super_food_chance: f64,
    /// Probability of spawning one power-up per tick
    pub power_up_spawn_rate: f64,
    pub max_power_ups: usize,
    pub power_up_size: u32,
    pub respawn_delay_ms: u64,
    pub spawn_protection_ms: u64,
    pub spawn_attempts: usize,
    /// Minimum distance of a freshly spawned body from every edge
    pub spawn_margin: i32,
    /// Inset of the deterministic corner spawns
    pub fallback_spawn_inset: i32,
    /// 0 disables the match timer
    pub match_duration_ms: u64,
    pub max_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 60,
            grid_height: 40,
            tick_interval_ms: 50,
            initial_snake_length: 3,
            initial_foods: 5,
            food_spawn_rate: 0.1,
            super_food_chance: 0.1,
            power_up_spawn_rate: 0.02,
            max_power_ups: 3,
            power_up_size: 2,
            respawn_delay_ms: 3000,
            spawn_protection_ms: 1000,
            spawn_attempts: 100,
            spawn_margin: 3,
            fallback_spawn_inset: 10,
            match_duration_ms: 180_000,
            max_players: 8,
        }
    }
}

impl GameConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Food cap scales with the number of snakes in the room
    pub fn max_foods(&self, snake_count: usize) -> usize {
        (snake_count * 2).max(5)
    }
}

/// Broadcast and connection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub broadcast_interval_ms: u64,
    /// Every Nth broadcast is a full snapshot
    pub full_sync_every: u32,
    pub client_timeout: Duration,
    pub max_clients: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_ms: 50,
            full_sync_every: 10,
            client_timeout: Duration::from_secs(5),
            max_clients: 64,
        }
    }
}

impl NetworkConfig {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms.max(1))
    }
}
