//! Placement of snakes, food and power-ups on free cells

use rand::Rng;
use shared::config::GameConfig;
use shared::geometry::{
    extrude_body, in_bounds, is_occupied, random_unoccupied_area, random_unoccupied_position,
};
use shared::{
    Direction, Food, FoodKind, GameState, Position, PowerUp, PowerUpKind, NORMAL_FOOD_VALUE,
    SUPER_FOOD_VALUE,
};
use std::collections::HashSet;

/// Every cell taken by a snake body, a food or a power-up footprint
pub fn occupied_cells(state: &GameState) -> HashSet<Position> {
    let mut occupied = HashSet::new();
    for snake in &state.snakes {
        occupied.extend(snake.segments.iter().copied());
    }
    occupied.extend(state.foods.iter().map(|f| f.position));
    for power_up in &state.power_ups {
        occupied.extend(power_up.footprint());
    }
    occupied
}

/// Picks a body and heading for a new or respawning snake.
///
/// Tries random placements first and falls back to the deterministic corner
/// slot for `slot`, so a snake always gets a body even on a crowded grid.
pub fn find_spawn<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    occupied: &HashSet<Position>,
    slot: usize,
) -> (Vec<Position>, Direction) {
    random_spawn(rng, config, occupied).unwrap_or_else(|| fallback_spawn(config, slot))
}

fn random_spawn<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    occupied: &HashSet<Position>,
) -> Option<(Vec<Position>, Direction)> {
    let margin = config.spawn_margin.max(0);
    let (width, height) = (config.grid_width, config.grid_height);
    if width <= 2 * margin || height <= 2 * margin {
        return None;
    }

    let inside_margin = |cell: &Position| {
        cell.x >= margin && cell.x < width - margin && cell.y >= margin && cell.y < height - margin
    };

    for _ in 0..config.spawn_attempts {
        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let head = Position::new(
            rng.gen_range(margin..width - margin),
            rng.gen_range(margin..height - margin),
        );
        let body = extrude_body(head, direction, config.initial_snake_length.max(1));

        if body
            .iter()
            .all(|cell| inside_margin(cell) && !is_occupied(*cell, occupied))
        {
            return Some((body, direction));
        }
    }
    None
}

/// Corner slot `slot % 4`, inset from the edges and facing inward
pub fn fallback_spawn(config: &GameConfig, slot: usize) -> (Vec<Position>, Direction) {
    let (width, height) = (config.grid_width.max(1), config.grid_height.max(1));
    let inset = config.fallback_spawn_inset;

    let (head, direction) = match slot % 4 {
        0 => (Position::new(inset, inset), Direction::Right),
        1 => (Position::new(width - 1 - inset, inset), Direction::Left),
        2 => (Position::new(inset, height - 1 - inset), Direction::Right),
        _ => (
            Position::new(width - 1 - inset, height - 1 - inset),
            Direction::Left,
        ),
    };

    let clamp = |cell: Position| {
        Position::new(cell.x.clamp(0, width - 1), cell.y.clamp(0, height - 1))
    };

    let body = extrude_body(clamp(head), direction, config.initial_snake_length.max(1))
        .into_iter()
        .map(clamp)
        .collect();

    (body, direction)
}

pub fn spawn_food<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    occupied: &HashSet<Position>,
    id: u32,
) -> Option<Food> {
    let position = random_unoccupied_position(
        rng,
        config.grid_width,
        config.grid_height,
        occupied,
        config.spawn_attempts,
    )?;

    let is_super = rng.gen_bool(config.super_food_chance.clamp(0.0, 1.0));
    Some(Food {
        id,
        position,
        kind: if is_super {
            FoodKind::Super
        } else {
            FoodKind::Normal
        },
        value: if is_super {
            SUPER_FOOD_VALUE
        } else {
            NORMAL_FOOD_VALUE
        },
    })
}

pub fn spawn_power_up<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    occupied: &HashSet<Position>,
    id: u32,
    now: u64,
) -> Option<PowerUp> {
    let size = config.power_up_size.max(1);
    let position = random_unoccupied_area(
        rng,
        config.grid_width,
        config.grid_height,
        size as i32,
        occupied,
        config.spawn_attempts,
    )?;

    let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
    Some(PowerUp {
        id,
        kind,
        position,
        duration: kind.duration_ms(),
        spawn_time: now,
        size,
    })
}

/// Food dropped on a vacated body cell; `None` when the cell is off-grid or already holds food
pub fn death_food(state: &GameState, config: &GameConfig, cell: Position, id: u32) -> Option<Food> {
    if !in_bounds(cell, config.grid_width, config.grid_height) || state.food_at(cell).is_some() {
        return None;
    }
    Some(Food {
        id,
        position: cell,
        kind: FoodKind::Normal,
        value: NORMAL_FOOD_VALUE,
    })
}
