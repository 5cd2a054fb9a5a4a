use crate::game::{RenderSnake, RenderState};
use macroquad::prelude::*;
use shared::{Direction, FoodKind, GameResult, PowerUp, PowerUpKind};

const HUD_HEIGHT: f32 = 90.0;
const BACKGROUND: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const GRID_LINE: Color = Color::new(0.16, 0.16, 0.16, 1.0);

/// Everything drawn around the arena that does not come from a snapshot
#[derive(Debug, Clone)]
pub struct HudInfo<'a> {
    pub player_id: Option<u32>,
    pub room: Option<&'a str>,
    pub is_host: bool,
    pub in_game: bool,
    pub ping_ms: u64,
    pub fake_ping_ms: u64,
    pub interpolation_enabled: bool,
    pub results: Option<&'a [GameResult]>,
    pub rejection: Option<&'a str>,
    pub last_ack: Option<(u32, Direction)>,
}

/// Parses `#RRGGBB`, falling back to grey
pub fn parse_color(hex: &str) -> Color {
    hex.strip_prefix('#')
        .filter(|digits| digits.len() == 6)
        .and_then(|digits| u32::from_str_radix(digits, 16).ok())
        .map(Color::from_hex)
        .unwrap_or(GRAY)
}

fn power_up_color(kind: PowerUpKind) -> Color {
    match kind {
        PowerUpKind::SpeedBoost => Color::from_rgba(255, 165, 0, 255),
        PowerUpKind::SpeedSlow => Color::from_rgba(100, 149, 237, 255),
        PowerUpKind::WallPass => Color::from_rgba(186, 85, 211, 255),
        PowerUpKind::Invincible => GOLD,
        PowerUpKind::ShrinkOpponent => Color::from_rgba(220, 20, 60, 255),
    }
}

/// Initials of a power-up's label, drawn on its footprint
pub fn power_up_caption(kind: PowerUpKind) -> String {
    kind.label()
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

pub struct Renderer {
    grid_width: i32,
    grid_height: i32,
}

impl Renderer {
    pub fn new(grid_width: i32, grid_height: i32) -> Self {
        Renderer {
            grid_width: grid_width.max(1),
            grid_height: grid_height.max(1),
        }
    }

    /// Side of one cell in pixels, fitted to the window below the HUD
    fn cell_size(&self) -> f32 {
        let by_width = screen_width() / self.grid_width as f32;
        let by_height = (screen_height() - HUD_HEIGHT).max(1.0) / self.grid_height as f32;
        by_width.min(by_height).max(1.0)
    }

    pub fn render(&self, state: Option<&RenderState>, hud: &HudInfo) {
        clear_background(BACKGROUND);

        let cell = self.cell_size();
        self.draw_grid(cell);

        if let Some(state) = state {
            for food in &state.foods {
                let color = match food.kind {
                    FoodKind::Normal => Color::from_rgba(120, 220, 120, 255),
                    FoodKind::Super => Color::from_rgba(255, 215, 0, 255),
                };
                let radius = match food.kind {
                    FoodKind::Normal => cell * 0.3,
                    FoodKind::Super => cell * 0.45,
                };
                draw_circle(
                    (food.position.x as f32 + 0.5) * cell,
                    HUD_HEIGHT + (food.position.y as f32 + 0.5) * cell,
                    radius,
                    color,
                );
            }

            for power_up in &state.power_ups {
                self.draw_power_up(power_up, cell);
            }

            for snake in &state.snakes {
                let is_local = Some(snake.player_id) == hud.player_id;
                self.draw_snake(snake, cell, is_local);
            }

            self.draw_scoreboard(&state.snakes, hud.player_id);
            self.draw_messages(&state.messages);
        }

        self.draw_hud(hud);

        if let Some(results) = hud.results {
            self.draw_results(results);
        }
    }

    fn draw_grid(&self, cell: f32) {
        let width = self.grid_width as f32 * cell;
        let height = self.grid_height as f32 * cell;
        draw_rectangle_lines(0.0, HUD_HEIGHT, width, height, 2.0, GRID_LINE);
        for x in 1..self.grid_width {
            let px = x as f32 * cell;
            draw_line(px, HUD_HEIGHT, px, HUD_HEIGHT + height, 1.0, GRID_LINE);
        }
        for y in 1..self.grid_height {
            let py = HUD_HEIGHT + y as f32 * cell;
            draw_line(0.0, py, width, py, 1.0, GRID_LINE);
        }
    }

    fn draw_power_up(&self, power_up: &PowerUp, cell: f32) {
        let size = power_up.size as f32 * cell;
        let x = power_up.position.x as f32 * cell;
        let y = HUD_HEIGHT + power_up.position.y as f32 * cell;
        draw_rectangle(x, y, size, size, power_up_color(power_up.kind));
        draw_rectangle_lines(x, y, size, size, 2.0, WHITE);

        let caption = power_up_caption(power_up.kind);
        let font_size = (size * 0.5).max(10.0);
        let dims = measure_text(&caption, None, font_size as u16, 1.0);
        draw_text(
            &caption,
            x + (size - dims.width) / 2.0,
            y + (size + dims.offset_y) / 2.0,
            font_size,
            BLACK,
        );
    }

    fn draw_snake(&self, snake: &RenderSnake, cell: f32, is_local: bool) {
        if !snake.alive {
            return;
        }

        let mut color = parse_color(&snake.color);
        if snake.paused {
            color.a = 0.4;
        }

        for (i, &(x, y)) in snake.segments.iter().enumerate() {
            let inset = if i == 0 { 0.0 } else { cell * 0.1 };
            draw_rectangle(
                x * cell + inset,
                HUD_HEIGHT + y * cell + inset,
                cell - inset * 2.0,
                cell - inset * 2.0,
                color,
            );
        }

        if let Some(&(x, y)) = snake.segments.first() {
            let outline = if is_local { WHITE } else { DARKGRAY };
            draw_rectangle_lines(x * cell, HUD_HEIGHT + y * cell, cell, cell, 2.0, outline);
            draw_text(&snake.name, x * cell, HUD_HEIGHT + y * cell - 4.0, 14.0, WHITE);
        }
    }

    fn draw_scoreboard(&self, snakes: &[RenderSnake], local: Option<u32>) {
        let mut ranked: Vec<&RenderSnake> = snakes.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        let x = screen_width() - 200.0;
        for (i, snake) in ranked.iter().take(8).enumerate() {
            let y = 14.0 + i as f32 * 10.0;
            let mut label = format!("{} {}", snake.name, snake.score);
            if !snake.alive {
                label.push_str(" (dead)");
            }
            if snake.paused {
                label.push_str(" (paused)");
            }
            let color = if Some(snake.player_id) == local {
                WHITE
            } else {
                parse_color(&snake.color)
            };
            draw_text(&label, x, y, 12.0, color);
        }
    }

    fn draw_messages(&self, messages: &[String]) {
        let x = screen_width() / 2.0 - 120.0;
        for (i, message) in messages.iter().enumerate() {
            draw_text(message, x, 14.0 + i as f32 * 12.0, 14.0, LIGHTGRAY);
        }
    }

    fn draw_hud(&self, hud: &HudInfo) {
        let y_start = 10.0;

        let connection_color = if hud.player_id.is_some() { GREEN } else { RED };
        draw_rectangle(10.0, y_start, 8.0, 8.0, connection_color);
        let room = hud.room.unwrap_or("-");
        let role = if hud.is_host { " (host)" } else { "" };
        draw_text(&format!("ROOM {}{}", room, role), 22.0, y_start + 8.0, 14.0, WHITE);

        // Ping bars as in a signal meter
        let ping_y = y_start + 18.0;
        let total_ping = hud.ping_ms + hud.fake_ping_ms;
        let ping_bars = (total_ping / 20).min(10) as i32;
        for i in 0..10i32 {
            let bar_color = if i < ping_bars {
                if total_ping < 50 {
                    GREEN
                } else if total_ping < 100 {
                    YELLOW
                } else {
                    RED
                }
            } else {
                Color::from_rgba(51, 51, 51, 255)
            };
            draw_rectangle(10.0 + (i as f32) * 3.0, ping_y, 2.0, 8.0, bar_color);
        }
        draw_text(&format!("{}ms", total_ping), 45.0, ping_y + 8.0, 12.0, WHITE);

        let interp_color = if hud.interpolation_enabled { GREEN } else { RED };
        draw_rectangle(10.0, ping_y + 16.0, 8.0, 8.0, interp_color);
        draw_text("I: interpolation", 22.0, ping_y + 24.0, 12.0, WHITE);

        if let (true, Some((tick, direction))) = (hud.in_game, hud.last_ack) {
            let ack = format!("ACK {:?} @{}", direction, tick);
            draw_text(&ack, 140.0, ping_y + 24.0, 12.0, GRAY);
        }

        let status = if let Some(reason) = hud.rejection {
            format!("Rejected: {}", reason)
        } else if hud.in_game {
            "Arrows/WASD steer, P pause".to_string()
        } else if hud.is_host {
            "Press Enter to start".to_string()
        } else {
            "Waiting for the host to start".to_string()
        };
        draw_text(&status, 10.0, ping_y + 44.0, 16.0, WHITE);
    }

    fn draw_results(&self, results: &[GameResult]) {
        let width = 320.0;
        let height = 40.0 + results.len() as f32 * 20.0;
        let x = (screen_width() - width) / 2.0;
        let y = (screen_height() - height) / 2.0;

        draw_rectangle(x, y, width, height, Color::new(0.0, 0.0, 0.0, 0.8));
        draw_rectangle_lines(x, y, width, height, 2.0, WHITE);
        draw_text("GAME OVER", x + 10.0, y + 24.0, 22.0, WHITE);

        for (i, result) in results.iter().enumerate() {
            let line = format!(
                "#{} {}  {} pts  {} kills  {}s",
                result.rank,
                result.player_name,
                result.score,
                result.kill_count,
                result.survival_time / 1000
            );
            draw_text(&line, x + 10.0, y + 46.0 + i as f32 * 20.0, 16.0, LIGHTGRAY);
        }
    }
}
