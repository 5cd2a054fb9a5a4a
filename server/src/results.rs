//! Final standings and the hook that persists them

use log::info;
use shared::{GameResult, GameState};

/// Standings sorted by descending score; equal scores keep roster order
pub fn compute_results(state: &GameState, now: u64) -> Vec<GameResult> {
    let mut snakes: Vec<_> = state.snakes.iter().collect();
    snakes.sort_by(|a, b| b.score.cmp(&a.score));

    snakes
        .into_iter()
        .enumerate()
        .map(|(i, snake)| GameResult {
            player_id: snake.player_id,
            player_name: snake.player_name.clone(),
            score: snake.score,
            rank: i as u32 + 1,
            kill_count: snake.kills,
            survival_time: now.saturating_sub(snake.joined_at),
        })
        .collect()
}

/// Receives the standings of every finished game.
///
/// Called from a blocking task, so implementations may do synchronous I/O.
pub trait ResultRecorder: Send + Sync {
    fn record(&self, room: &str, results: &[GameResult]);
}

/// Writes the standings to the log
#[derive(Debug, Default)]
pub struct LogRecorder;

impl ResultRecorder for LogRecorder {
    fn record(&self, room: &str, results: &[GameResult]) {
        info!("Room {} finished with {} players", room, results.len());
        for result in results {
            info!(
                "  #{} {} score={} kills={} survived={}s",
                result.rank,
                result.player_name,
                result.score,
                result.kill_count,
                result.survival_time / 1000
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Direction, Position, Snake};

    fn snake(player_id: u32, score: u32, joined_at: u64) -> Snake {
        let mut snake = Snake::new(
            player_id,
            player_id,
            format!("p{}", player_id),
            "#FF6B6B",
            vec![Position::new(1, 1)],
            Direction::Right,
            joined_at,
        );
        snake.score = score;
        snake
    }

    #[test]
    fn test_results_ranked_by_score() {
        let mut state = GameState::new(0);
        state.snakes.push(snake(1, 20, 0));
        state.snakes.push(snake(2, 50, 1_000));
        state.snakes.push(snake(3, 20, 2_000));
        state.snakes[1].kills = 2;

        let results = compute_results(&state, 10_000);

        let order: Vec<u32> = results.iter().map(|r| r.player_id).collect();
        assert_eq!(order, vec![2, 1, 3]);
        let ranks: Vec<u32> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(results[0].kill_count, 2);
        assert_eq!(results[0].survival_time, 9_000);
    }

    #[test]
    fn test_results_empty_room() {
        assert!(compute_results(&GameState::new(0), 5).is_empty());
    }
}
