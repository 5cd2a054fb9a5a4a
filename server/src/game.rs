//! Authoritative per-room simulation
//!
//! A [`Simulation`] exclusively owns one room's [`GameState`]. Inputs only
//! queue a direction on the snake; everything else happens inside
//! [`Simulation::tick`], which walks the snake roster in insertion order so
//! that the outcome of a tick is deterministic for a given RNG seed.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use shared::config::GameConfig;
use shared::geometry::{in_bounds, wrap};
use shared::{Direction, GameResult, GameState, Position, PowerUpKind, Snake, POWER_UP_SCORE};

use crate::error::InputError;
use crate::results::compute_results;
use crate::spawning::{
    death_food, find_spawn, occupied_cells, spawn_food, spawn_power_up,
};

/// Cell a snake will enter on its next move, or `None` if it would crash into a wall
fn next_head(snake: &Snake, width: i32, height: i32) -> Option<Position> {
    let next = snake.head()?.step(snake.direction);
    if in_bounds(next, width, height) {
        Some(next)
    } else if snake.wall_pass_charges > 0 {
        Some(wrap(next, width, height))
    } else {
        None
    }
}

/// A room member taking part in a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub player_id: u32,
    pub name: String,
    pub color: String,
}

impl Participant {
    pub fn new(player_id: u32, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
            color: color.into(),
        }
    }
}

pub struct Simulation {
    config: GameConfig,
    state: GameState,
    rng: StdRng,
    next_entity_id: u32,
}

impl Simulation {
    /// Starts a game with one snake per participant and the initial food
    pub fn new(config: GameConfig, participants: &[Participant], now: u64, rng: StdRng) -> Self {
        let mut simulation = Self {
            config,
            state: GameState::new(now),
            rng,
            next_entity_id: 1,
        };

        for participant in participants {
            simulation.add_player(participant, now);
        }

        for _ in 0..simulation.config.initial_foods {
            simulation.try_spawn_food();
        }

        info!(
            "Game started with {} players on a {}x{} grid",
            participants.len(),
            simulation.config.grid_width,
            simulation.config.grid_height
        );
        simulation
    }

    /// Resumes from an existing state, e.g. a hand-built scenario
    pub fn from_state(config: GameConfig, state: GameState, rng: StdRng) -> Self {
        let highest_id = state
            .snakes
            .iter()
            .map(|s| s.id)
            .chain(state.foods.iter().map(|f| f.id))
            .chain(state.power_ups.iter().map(|p| p.id))
            .max()
            .unwrap_or(0);

        Self {
            config,
            state,
            rng,
            next_entity_id: highest_id + 1,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Adds a snake for a player joining at game start or mid-game; returns its id
    pub fn add_player(&mut self, participant: &Participant, now: u64) -> u32 {
        if let Some(existing) = self.state.snake_by_player(participant.player_id) {
            return existing.id;
        }

        let occupied = occupied_cells(&self.state);
        let slot = self.state.snakes.len();
        let (segments, direction) = find_spawn(&mut self.rng, &self.config, &occupied, slot);

        let id = self.next_id();
        let snake = Snake::new(
            id,
            participant.player_id,
            participant.name.clone(),
            participant.color.clone(),
            segments,
            direction,
            now,
        );
        debug!(
            "Spawned snake {} for player {} at {:?}",
            id,
            participant.player_id,
            snake.head()
        );
        self.state.snakes.push(snake);
        id
    }

    /// Deletes the player's snake immediately, without dropping food
    pub fn remove_player(&mut self, player_id: u32) -> bool {
        let before = self.state.snakes.len();
        self.state.snakes.retain(|s| s.player_id != player_id);
        before != self.state.snakes.len()
    }

    /// Queues a direction for the next tick. A later valid input replaces an earlier one.
    pub fn queue_input(&mut self, player_id: u32, direction: Direction) -> Result<(), InputError> {
        let snake = self
            .state
            .snake_by_player_mut(player_id)
            .ok_or(InputError::UnknownPlayer(player_id))?;

        if !snake.alive {
            return Err(InputError::NotAlive(player_id));
        }
        if snake.paused {
            return Err(InputError::Paused(player_id));
        }
        if direction.is_opposite(snake.direction) {
            return Err(InputError::Reversal {
                current: snake.direction,
                requested: direction,
            });
        }

        snake.pending_direction = Some(direction);
        Ok(())
    }

    /// Flips the pause flag; returns the new value
    pub fn toggle_pause(&mut self, player_id: u32) -> Option<bool> {
        let snake = self.state.snake_by_player_mut(player_id)?;
        snake.paused = !snake.paused;
        Some(snake.paused)
    }

    /// Marks the game as finished; the next broadcast sends the results
    pub fn end(&mut self) {
        if self.state.is_running {
            self.state.is_running = false;
            info!("Game ended at tick {}", self.state.tick);
        }
    }

    pub fn results(&self, now: u64) -> Vec<GameResult> {
        compute_results(&self.state, now)
    }

    /// Advances the game by one step
    pub fn tick(&mut self, now: u64) {
        if !self.state.is_running {
            return;
        }

        let duration = self.config.match_duration_ms;
        if duration > 0 && now >= self.state.start_time.saturating_add(duration) {
            self.state.push_message("Time is up!");
            self.end();
            return;
        }

        self.state.tick += 1;

        for snake in &mut self.state.snakes {
            snake.effects.retain(|effect| effect.end_time > now);

            if let Some(direction) = snake.pending_direction.take() {
                if !direction.is_opposite(snake.direction) {
                    snake.direction = direction;
                }
            }
        }

        self.respawn_ready(now);

        for index in 0..self.state.snakes.len() {
            let snake = &self.state.snakes[index];
            if snake.alive && !snake.paused {
                self.move_snake(index, now);
            }
        }

        self.spawn_pickups(now);
    }

    fn respawn_ready(&mut self, now: u64) {
        for index in 0..self.state.snakes.len() {
            let snake = &self.state.snakes[index];
            let ready = !snake.alive
                && !snake.paused
                && snake.respawn_time.map_or(false, |at| now >= at);
            if ready {
                self.respawn(index, now);
            }
        }
    }

    fn respawn(&mut self, index: usize, now: u64) {
        let occupied = occupied_cells(&self.state);
        let (segments, direction) = find_spawn(&mut self.rng, &self.config, &occupied, index);

        let snake = &mut self.state.snakes[index];
        snake.segments = segments;
        snake.direction = direction;
        snake.pending_direction = None;
        snake.alive = true;
        snake.respawn_time = None;
        snake.spawn_time = Some(now);
        snake.effects.clear();
        snake.max_length = snake.max_length.max(snake.segments.len() as u32);

        debug!("Snake {} respawned at {:?}", snake.id, snake.head());
    }

    fn move_snake(&mut self, index: usize, now: u64) {
        let (width, height) = (self.config.grid_width, self.config.grid_height);
        let protection = self.config.spawn_protection_ms;

        let snake = &mut self.state.snakes[index];
        let Some(head) = snake.head() else {
            return;
        };

        let mut new_head = head.step(snake.direction);
        if !in_bounds(new_head, width, height) {
            if snake.wall_pass_charges > 0 {
                snake.wall_pass_charges -= 1;
                new_head = wrap(new_head, width, height);
            } else {
                self.kill(index, None, now);
                return;
            }
        }

        // The tail leaves its cell this tick, so it cannot be hit.
        let len = snake.segments.len();
        let hits_self = len > 2 && snake.segments[1..len - 1].contains(&new_head);
        if hits_self && !snake.consume_invincibility() {
            self.kill(index, None, now);
            return;
        }

        let mover_protected = self.state.snakes[index].is_spawn_protected(now, protection);
        for other in 0..self.state.snakes.len() {
            if other == index {
                continue;
            }
            let target = &self.state.snakes[other];
            if !target.alive || target.is_empty() {
                continue;
            }
            if mover_protected || target.is_spawn_protected(now, protection) {
                continue;
            }

            // Snakes after `index` have not moved yet this tick; meeting such a
            // head only counts as head-to-head when the two heads swap cells.
            let target_moves = !target.paused;
            let head_to_head = target_moves
                && target.head() == Some(new_head)
                && (other < index || next_head(target, width, height) == Some(head));

            if head_to_head {
                let mover_survives = self.state.snakes[index].consume_invincibility();
                let target_survives = self.state.snakes[other].consume_invincibility();
                if !target_survives {
                    self.kill(other, Some(index), now);
                }
                if !mover_survives {
                    self.kill(index, Some(other), now);
                    return;
                }
            } else if target.occupies(new_head)
                && !self.state.snakes[index].consume_invincibility()
            {
                self.kill(index, Some(other), now);
                return;
            }
        }

        self.state.snakes[index].segments.insert(0, new_head);

        if let Some(food_index) = self.state.food_at(new_head) {
            let food = self.state.foods.remove(food_index);
            self.state.snakes[index].score += food.value;
        } else {
            self.state.snakes[index].segments.pop();
        }

        if let Some(power_up_index) = self.state.power_up_at(new_head) {
            let power_up = self.state.power_ups.remove(power_up_index);
            self.apply_power_up(index, power_up.kind);
        }

        let snake = &mut self.state.snakes[index];
        snake.max_length = snake.max_length.max(snake.segments.len() as u32);
    }

    /// Converts the body to food and schedules the respawn
    fn kill(&mut self, index: usize, killer: Option<usize>, now: u64) {
        let respawn_at = now + self.config.respawn_delay_ms;
        let snake = &mut self.state.snakes[index];
        let cells = std::mem::take(&mut snake.segments);

        snake.alive = false;
        snake.pending_direction = None;
        snake.effects.clear();
        snake.wall_pass_charges = 0;
        snake.invincible_charges = 0;
        snake.respawn_time = Some(respawn_at);
        let victim_name = snake.player_name.clone();

        for cell in cells {
            let id = self.next_entity_id;
            if let Some(food) = death_food(&self.state, &self.config, cell, id) {
                self.next_entity_id += 1;
                self.state.foods.push(food);
            }
        }

        match killer {
            Some(killer_index) => {
                let killer = &mut self.state.snakes[killer_index];
                killer.kills += 1;
                let message = format!("{} eliminated {}", killer.player_name, victim_name);
                self.state.push_message(message);
            }
            None => debug!("{} crashed", victim_name),
        }
    }

    fn apply_power_up(&mut self, index: usize, kind: PowerUpKind) {
        let snake = &mut self.state.snakes[index];
        snake.score += POWER_UP_SCORE;

        match kind {
            PowerUpKind::SpeedBoost => snake.speed_boost_count += 1,
            PowerUpKind::SpeedSlow => snake.speed_slow_count += 1,
            PowerUpKind::WallPass => snake.wall_pass_charges += 1,
            PowerUpKind::Invincible => snake.invincible_charges += 1,
            PowerUpKind::ShrinkOpponent => self.shrink_random_opponent(index),
        }
    }

    fn shrink_random_opponent(&mut self, attacker: usize) {
        let candidates: Vec<usize> = self
            .state
            .snakes
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != attacker && s.alive && !s.is_empty())
            .map(|(i, _)| i)
            .collect();

        let attacker_name = self.state.snakes[attacker].player_name.clone();
        if candidates.is_empty() {
            self.state
                .push_message(format!("{} found no one to shrink", attacker_name));
            return;
        }

        let victim = candidates[self.rng.gen_range(0..candidates.len())];
        let snake = &mut self.state.snakes[victim];
        let new_len = (snake.segments.len() / 2).max(3);
        snake.segments.truncate(new_len);
        let message = format!("{} shrank {}", attacker_name, snake.player_name);
        self.state.push_message(message);
    }

    fn spawn_pickups(&mut self, now: u64) {
        let max_foods = self.config.max_foods(self.state.snakes.len());
        let food_rate = self.config.food_spawn_rate.clamp(0.0, 1.0);
        if self.state.foods.len() < max_foods && self.rng.gen_bool(food_rate) {
            self.try_spawn_food();
        }

        let power_up_rate = self.config.power_up_spawn_rate.clamp(0.0, 1.0);
        if self.state.power_ups.len() < self.config.max_power_ups
            && self.rng.gen_bool(power_up_rate)
        {
            let occupied = occupied_cells(&self.state);
            let id = self.next_entity_id;
            if let Some(power_up) = spawn_power_up(&mut self.rng, &self.config, &occupied, id, now)
            {
                self.next_entity_id += 1;
                self.state.power_ups.push(power_up);
            }
        }
    }

    fn try_spawn_food(&mut self) {
        let occupied = occupied_cells(&self.state);
        let id = self.next_entity_id;
        if let Some(food) = spawn_food(&mut self.rng, &self.config, &occupied, id) {
            self.next_entity_id += 1;
            self.state.foods.push(food);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use shared::{Food, FoodKind, Position, PowerUp};

    fn quiet_config() -> GameConfig {
        GameConfig {
            food_spawn_rate: 0.0,
            power_up_spawn_rate: 0.0,
            initial_foods: 0,
            match_duration_ms: 0,
            ..GameConfig::default()
        }
    }

    fn snake_at(id: u32, cells: &[(i32, i32)], direction: Direction, spawned: u64) -> Snake {
        let segments = cells.iter().map(|&(x, y)| Position::new(x, y)).collect();
        Snake::new(id, id, format!("p{}", id), "#FF6B6B", segments, direction, spawned)
    }

    fn scenario(snakes: Vec<Snake>) -> Simulation {
        let mut state = GameState::new(0);
        state.snakes = snakes;
        Simulation::from_state(quiet_config(), state, StdRng::seed_from_u64(1))
    }

    const LATER: u64 = 10_000;

    #[test]
    fn test_new_game_spawns_every_participant() {
        let participants = vec![
            Participant::new(1, "alice", "#FF6B6B"),
            Participant::new(2, "bob", "#4ECDC4"),
        ];
        let sim = Simulation::new(
            GameConfig::default(),
            &participants,
            0,
            StdRng::seed_from_u64(5),
        );

        assert_eq!(sim.state().snakes.len(), 2);
        assert_eq!(sim.state().foods.len(), 5);
        assert!(sim.state().snakes.iter().all(|s| s.len() == 3 && s.alive));
        assert_eq!(sim.state().snakes[1].color, "#4ECDC4");
    }

    #[test]
    fn test_move_without_food_keeps_length() {
        let mut sim = scenario(vec![snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0)]);
        sim.tick(LATER);

        let snake = &sim.state().snakes[0];
        assert_eq!(snake.segments, vec![Position::new(6, 5), Position::new(5, 5), Position::new(4, 5)]);
        assert_eq!(snake.score, 0);
        assert_eq!(sim.state().tick, 1);
    }

    #[test]
    fn test_reversal_is_rejected() {
        let mut sim = scenario(vec![snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0)]);

        let result = sim.queue_input(1, Direction::Left);
        assert!(matches!(result, Err(InputError::Reversal { .. })));
        sim.tick(LATER);
        assert_eq!(sim.state().snakes[0].direction, Direction::Right);
    }

    #[test]
    fn test_last_valid_input_wins() {
        let mut sim = scenario(vec![snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0)]);

        sim.queue_input(1, Direction::Up).unwrap();
        sim.queue_input(1, Direction::Down).unwrap();
        sim.tick(LATER);

        assert_eq!(sim.state().snakes[0].direction, Direction::Down);
        assert_eq!(sim.state().snakes[0].head(), Some(Position::new(5, 6)));
    }

    #[test]
    fn test_input_for_unknown_or_paused_player() {
        let mut sim = scenario(vec![snake_at(1, &[(5, 5)], Direction::Right, 0)]);

        assert_eq!(
            sim.queue_input(9, Direction::Up),
            Err(InputError::UnknownPlayer(9))
        );
        assert_eq!(sim.toggle_pause(1), Some(true));
        assert_eq!(sim.queue_input(1, Direction::Up), Err(InputError::Paused(1)));
    }

    #[test]
    fn test_paused_snake_does_not_move() {
        let mut sim = scenario(vec![snake_at(1, &[(5, 5), (4, 5)], Direction::Right, 0)]);
        sim.toggle_pause(1);
        sim.tick(LATER);

        assert_eq!(sim.state().snakes[0].head(), Some(Position::new(5, 5)));
    }

    #[test]
    fn test_wall_kills_without_charge() {
        let mut sim = scenario(vec![snake_at(1, &[(59, 5), (58, 5), (57, 5)], Direction::Right, 0)]);
        sim.tick(LATER);

        let snake = &sim.state().snakes[0];
        assert!(!snake.alive);
        assert!(snake.segments.is_empty());
        assert_eq!(snake.respawn_time, Some(LATER + 3000));
        assert_eq!(sim.state().foods.len(), 3);
    }

    #[test]
    fn test_wall_pass_wraps_and_consumes_charge() {
        let mut snake = snake_at(1, &[(59, 5), (58, 5), (57, 5)], Direction::Right, 0);
        snake.wall_pass_charges = 2;
        let mut sim = scenario(vec![snake]);
        sim.tick(LATER);

        let snake = &sim.state().snakes[0];
        assert!(snake.alive);
        assert_eq!(snake.head(), Some(Position::new(0, 5)));
        assert_eq!(snake.wall_pass_charges, 1);
    }

    #[test]
    fn test_self_collision_and_invincibility() {
        // Head turns down into its own body.
        let body = [(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)];
        let mut sim = scenario(vec![snake_at(1, &body, Direction::Down, 0)]);
        sim.tick(LATER);
        assert!(!sim.state().snakes[0].alive);

        let mut shielded = snake_at(1, &body, Direction::Down, 0);
        shielded.invincible_charges = 1;
        let mut sim = scenario(vec![shielded]);
        sim.tick(LATER);
        let snake = &sim.state().snakes[0];
        assert!(snake.alive);
        assert_eq!(snake.invincible_charges, 0);
    }

    #[test]
    fn test_following_own_tail_is_safe() {
        let body = [(5, 5), (6, 5), (6, 6), (5, 6)];
        let mut sim = scenario(vec![snake_at(1, &body, Direction::Down, 0)]);
        sim.tick(LATER);

        assert!(sim.state().snakes[0].alive);
        assert_eq!(sim.state().snakes[0].head(), Some(Position::new(5, 6)));
    }

    #[test]
    fn test_body_collision_kills_mover_and_credits_owner() {
        let mover = snake_at(1, &[(5, 4), (5, 3), (5, 2)], Direction::Down, 0);
        let wall = snake_at(2, &[(7, 5), (6, 5), (5, 5), (4, 5)], Direction::Up, 0);
        let mut sim = scenario(vec![mover, wall]);
        sim.queue_input(2, Direction::Right).unwrap();
        sim.tick(LATER);

        assert!(!sim.state().snakes[0].alive);
        assert!(sim.state().snakes[1].alive);
        assert_eq!(sim.state().snakes[1].kills, 1);
        assert_eq!(sim.state().messages.back().map(String::as_str), Some("p2 eliminated p1"));
    }

    #[test]
    fn test_head_to_head_with_one_shield() {
        let mut a = snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0);
        a.invincible_charges = 1;
        let b = snake_at(2, &[(6, 5), (7, 5), (8, 5)], Direction::Left, 0);
        let mut sim = scenario(vec![a, b]);
        sim.tick(LATER);

        let a = &sim.state().snakes[0];
        let b = &sim.state().snakes[1];
        assert!(a.alive);
        assert_eq!(a.invincible_charges, 0);
        assert_eq!(a.kills, 1);
        assert!(!b.alive);
    }

    #[test]
    fn test_head_hit_without_swap_is_independent_of_roster_order() {
        let a = snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0);
        let b = snake_at(2, &[(6, 5), (6, 6), (6, 7)], Direction::Up, 0);

        for roster in [vec![a.clone(), b.clone()], vec![b.clone(), a.clone()]] {
            let mut sim = scenario(roster);
            sim.tick(LATER);

            let a = sim.state().snake_by_player(1).unwrap();
            let b = sim.state().snake_by_player(2).unwrap();
            assert!(!a.alive);
            assert!(b.alive);
            assert_eq!(b.head(), Some(Position::new(6, 4)));
            assert_eq!(b.kills, 1);
        }
    }

    #[test]
    fn test_head_swap_kills_both_in_either_order() {
        let a = snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0);
        let b = snake_at(2, &[(6, 5), (7, 5), (8, 5)], Direction::Left, 0);

        for roster in [vec![a.clone(), b.clone()], vec![b.clone(), a.clone()]] {
            let mut sim = scenario(roster);
            sim.tick(LATER);
            assert!(sim.state().snakes.iter().all(|s| !s.alive));
        }
    }

    #[test]
    fn test_respawn_after_delay() {
        let mut sim = scenario(vec![snake_at(1, &[(59, 5), (58, 5), (57, 5)], Direction::Right, 0)]);
        sim.tick(LATER);
        assert!(!sim.state().snakes[0].alive);

        sim.tick(LATER + 2_999);
        assert!(!sim.state().snakes[0].alive);

        sim.tick(LATER + 3_000);
        let snake = &sim.state().snakes[0];
        assert!(snake.alive);
        assert!(snake.len() >= 3);
        assert_eq!(snake.spawn_time, Some(LATER + 3_000));
        assert_eq!(snake.respawn_time, None);
    }

    #[test]
    fn test_paused_dead_snake_waits() {
        let mut sim = scenario(vec![snake_at(1, &[(59, 5), (58, 5)], Direction::Right, 0)]);
        sim.tick(LATER);
        sim.toggle_pause(1);
        sim.tick(LATER + 5_000);
        assert!(!sim.state().snakes[0].alive);
    }

    #[test]
    fn test_power_up_pickup_adds_charge_and_bonus() {
        let mut state = GameState::new(0);
        state
            .snakes
            .push(snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0));
        state.power_ups.push(PowerUp {
            id: 50,
            kind: PowerUpKind::WallPass,
            position: Position::new(6, 4),
            duration: 8000,
            spawn_time: 0,
            size: 2,
        });
        let mut sim = Simulation::from_state(quiet_config(), state, StdRng::seed_from_u64(1));
        sim.tick(LATER);

        let snake = &sim.state().snakes[0];
        assert_eq!(snake.wall_pass_charges, 1);
        assert_eq!(snake.score, POWER_UP_SCORE);
        assert!(sim.state().power_ups.is_empty());
    }

    #[test]
    fn test_shrink_opponent() {
        let mut state = GameState::new(0);
        state
            .snakes
            .push(snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0));
        let long: Vec<(i32, i32)> = (0..10).map(|x| (20 - x, 20)).collect();
        state.snakes.push(snake_at(2, &long, Direction::Right, 0));
        state.power_ups.push(PowerUp {
            id: 50,
            kind: PowerUpKind::ShrinkOpponent,
            position: Position::new(6, 5),
            duration: 0,
            spawn_time: 0,
            size: 1,
        });
        let mut sim = Simulation::from_state(quiet_config(), state, StdRng::seed_from_u64(1));
        sim.tick(LATER);

        assert_eq!(sim.state().snakes[1].len(), 5);
        assert_eq!(sim.state().messages.back().map(String::as_str), Some("p1 shrank p2"));
    }

    #[test]
    fn test_shrink_without_target() {
        let mut state = GameState::new(0);
        state
            .snakes
            .push(snake_at(1, &[(5, 5), (4, 5), (3, 5)], Direction::Right, 0));
        state.power_ups.push(PowerUp {
            id: 50,
            kind: PowerUpKind::ShrinkOpponent,
            position: Position::new(6, 5),
            duration: 0,
            spawn_time: 0,
            size: 1,
        });
        let mut sim = Simulation::from_state(quiet_config(), state, StdRng::seed_from_u64(1));
        sim.tick(LATER);

        assert_eq!(
            sim.state().messages.back().map(String::as_str),
            Some("p1 found no one to shrink")
        );
    }

    #[test]
    fn test_death_clears_charges_keeps_score() {
        let mut snake = snake_at(1, &[(59, 5), (58, 5)], Direction::Right, 0);
        snake.invincible_charges = 2;
        snake.speed_boost_count = 3;
        snake.score = 70;
        let mut sim = scenario(vec![snake]);
        sim.tick(LATER);

        let snake = &sim.state().snakes[0];
        assert_eq!(snake.invincible_charges, 0);
        assert_eq!(snake.speed_boost_count, 3);
        assert_eq!(snake.score, 70);
    }

    #[test]
    fn test_match_timer_ends_game() {
        let config = GameConfig {
            match_duration_ms: 1_000,
            ..quiet_config()
        };
        let participants = vec![Participant::new(1, "alice", "#FF6B6B")];
        let mut sim = Simulation::new(config, &participants, 0, StdRng::seed_from_u64(2));

        sim.tick(500);
        assert!(sim.is_running());
        sim.tick(1_000);
        assert!(!sim.is_running());

        let tick = sim.state().tick;
        sim.tick(1_050);
        assert_eq!(sim.state().tick, tick);
    }

    #[test]
    fn test_food_spawns_up_to_cap() {
        let config = GameConfig {
            food_spawn_rate: 1.0,
            power_up_spawn_rate: 0.0,
            initial_foods: 0,
            match_duration_ms: 0,
            ..GameConfig::default()
        };
        let participants = vec![Participant::new(1, "alice", "#FF6B6B")];
        let mut sim = Simulation::new(config, &participants, 0, StdRng::seed_from_u64(4));
        sim.toggle_pause(1);

        for t in 1..20 {
            sim.tick(t * 50);
        }
        assert_eq!(sim.state().foods.len(), 5);
        let kinds_valid = sim.state().foods.iter().all(|f: &Food| match f.kind {
            FoodKind::Normal => f.value == 10,
            FoodKind::Super => f.value == 30,
        });
        assert!(kinds_valid);
    }

    #[test]
    fn test_remove_player_deletes_snake() {
        let mut sim = scenario(vec![
            snake_at(1, &[(5, 5)], Direction::Right, 0),
            snake_at(2, &[(9, 9)], Direction::Left, 0),
        ]);

        assert!(sim.remove_player(1));
        assert!(!sim.remove_player(1));
        assert_eq!(sim.state().snakes.len(), 1);
        assert!(sim.state().foods.is_empty());
    }
}
