//! Stateless grid helpers used for movement, collision and placement

use rand::Rng;
use std::collections::HashSet;

use crate::{Direction, Position};

pub fn in_bounds(pos: Position, width: i32, height: i32) -> bool {
    pos.x >= 0 && pos.x < width && pos.y >= 0 && pos.y < height
}

/// Wraps a cell toroidally back onto the grid
pub fn wrap(pos: Position, width: i32, height: i32) -> Position {
    Position::new(pos.x.rem_euclid(width), pos.y.rem_euclid(height))
}

pub fn manhattan_distance(a: Position, b: Position) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub fn is_occupied(pos: Position, occupied: &HashSet<Position>) -> bool {
    occupied.contains(&pos)
}

/// Samples up to `max_attempts` random cells and returns the first free one
pub fn random_unoccupied_position<R: Rng + ?Sized>(
    rng: &mut R,
    width: i32,
    height: i32,
    occupied: &HashSet<Position>,
    max_attempts: usize,
) -> Option<Position> {
    if width <= 0 || height <= 0 {
        return None;
    }

    (0..max_attempts)
        .map(|_| Position::new(rng.gen_range(0..width), rng.gen_range(0..height)))
        .find(|pos| !is_occupied(*pos, occupied))
}

/// Finds a free `size`×`size` square fully inside the grid and returns its top-left cell
pub fn random_unoccupied_area<R: Rng + ?Sized>(
    rng: &mut R,
    width: i32,
    height: i32,
    size: i32,
    occupied: &HashSet<Position>,
    max_attempts: usize,
) -> Option<Position> {
    let size = size.max(1);
    let max_x = width - size + 1;
    let max_y = height - size + 1;
    if max_x <= 0 || max_y <= 0 {
        return None;
    }

    (0..max_attempts)
        .map(|_| Position::new(rng.gen_range(0..max_x), rng.gen_range(0..max_y)))
        .find(|top_left| {
            (0..size).all(|dy| {
                (0..size).all(|dx| {
                    !is_occupied(Position::new(top_left.x + dx, top_left.y + dy), occupied)
                })
            })
        })
}

/// Lays out a straight body behind `head`, extending opposite to `direction`
pub fn extrude_body(head: Position, direction: Direction, length: usize) -> Vec<Position> {
    let back = direction.opposite();
    let mut body = Vec::with_capacity(length);
    let mut cell = head;
    for i in 0..length {
        if i > 0 {
            cell = cell.step(back);
        }
        body.push(cell);
    }
    body
}
