//! Choice between full and compressed snapshots for each broadcast

use shared::compression::compress_game_state;
use shared::{GameState, Packet};

use crate::results::compute_results;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Full,
    Compressed,
    Results,
    /// The game is over and the results were already sent
    Idle,
}

/// Per-room broadcast counter. The first broadcast and every `full_sync_every`-th
/// after it are full snapshots, so reconstruction drift never outlives one cycle.
#[derive(Debug)]
pub struct BroadcastScheduler {
    counter: u64,
    full_sync_every: u64,
    finished: bool,
}

impl BroadcastScheduler {
    pub fn new(full_sync_every: u32) -> Self {
        Self {
            counter: 0,
            full_sync_every: u64::from(full_sync_every.max(1)),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn next_kind(&mut self, is_running: bool) -> BroadcastKind {
        if self.finished {
            return BroadcastKind::Idle;
        }
        if !is_running {
            self.finished = true;
            return BroadcastKind::Results;
        }

        let kind = if self.counter % self.full_sync_every == 0 {
            BroadcastKind::Full
        } else {
            BroadcastKind::Compressed
        };
        self.counter += 1;
        kind
    }

    /// Builds the packet for this broadcast slot, or `None` once the game is over
    pub fn next_packet(&mut self, state: &GameState, now: u64) -> Option<Packet> {
        match self.next_kind(state.is_running) {
            BroadcastKind::Full => Some(Packet::FullState {
                state: state.clone(),
                timestamp: now,
            }),
            BroadcastKind::Compressed => Some(Packet::CompressedState {
                compressed: compress_game_state(state, now),
                timestamp: now,
            }),
            BroadcastKind::Results => Some(Packet::GameEnded {
                results: compute_results(state, now),
            }),
            BroadcastKind::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sync_cadence() {
        let mut scheduler = BroadcastScheduler::new(10);
        let kinds: Vec<BroadcastKind> = (0..21).map(|_| scheduler.next_kind(true)).collect();

        for (i, kind) in kinds.iter().enumerate() {
            let expected = if i % 10 == 0 {
                BroadcastKind::Full
            } else {
                BroadcastKind::Compressed
            };
            assert_eq!(*kind, expected, "broadcast {}", i);
        }
    }

    #[test]
    fn test_results_sent_once() {
        let mut scheduler = BroadcastScheduler::new(10);
        let mut state = GameState::new(0);
        assert!(matches!(
            scheduler.next_packet(&state, 1),
            Some(Packet::FullState { .. })
        ));
        assert!(matches!(
            scheduler.next_packet(&state, 2),
            Some(Packet::CompressedState { .. })
        ));

        state.is_running = false;
        assert!(matches!(
            scheduler.next_packet(&state, 3),
            Some(Packet::GameEnded { .. })
        ));
        assert!(scheduler.is_finished());
        assert_eq!(scheduler.next_packet(&state, 4), None);

        state.is_running = true;
        assert_eq!(scheduler.next_packet(&state, 5), None);
    }

    #[test]
    fn test_zero_cadence_means_always_full() {
        let mut scheduler = BroadcastScheduler::new(0);
        assert_eq!(scheduler.next_kind(true), BroadcastKind::Full);
        assert_eq!(scheduler.next_kind(true), BroadcastKind::Full);
    }
}
