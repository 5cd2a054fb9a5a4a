use shared::Direction;
use thiserror::Error;

/// Reasons a direction change is refused; all of them are dropped silently by the room
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("player {0} has no snake in this game")]
    UnknownPlayer(u32),

    #[error("snake of player {0} is dead")]
    NotAlive(u32),

    #[error("snake of player {0} is paused")]
    Paused(u32),

    #[error("cannot reverse from {current:?} to {requested:?}")]
    Reversal {
        current: Direction,
        requested: Direction,
    },
}
