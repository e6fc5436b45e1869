//! Game error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, Phase, Position, SeatNumber, UserId};

/// Errors raised by the in-memory table model and state machine.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("seat {seat} is outside 1..={seat_count}")]
    InvalidSeat { seat: SeatNumber, seat_count: u8 },
    #[error("seat {0} is taken")]
    SeatTaken(SeatNumber),
    #[error("user {0} is already seated at this table")]
    PlayerAlreadySeated(UserId),
    #[error("buy-in {buyin} is less than the minimum of {min_buyin}")]
    BuyInTooSmall { buyin: Chips, min_buyin: Chips },
    #[error("buy-in {buyin} is greater than the maximum of {max_buyin}")]
    BuyInTooLarge { buyin: Chips, max_buyin: Chips },
    #[error("user {0} is not seated at this table")]
    PlayerNotFound(UserId),
    #[error("can't bet {amount} with a stack of {stack}")]
    InsufficientStack { stack: Chips, amount: Chips },
    #[error("bet requires an amount")]
    MissingBetAmount,
    #[error("no hand in progress")]
    HandNotInProgress,
    #[error("hand already in progress ({0})")]
    HandInProgress(Phase),
    #[error("user {0} is not in the current hand")]
    PlayerNotInHand(UserId),
    #[error("not your turn")]
    OutOfTurn,
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("invalid game state: can't deal {requested} cards from {remaining}")]
    InsufficientCards { requested: usize, remaining: usize },
    #[error("invalid game state: no player at position {0}")]
    MissingPosition(Position),
    #[error("invalid game state: unparseable card {0:?}")]
    InvalidCard(String),
    #[error("invalid game state: unknown phase {0:?}")]
    UnknownPhase(String),
    #[error("invalid game state: chip total overflows")]
    ChipOverflow,
}

impl GameError {
    /// Whether the error signals a broken table rather than a bad request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCards { .. }
                | Self::MissingPosition(_)
                | Self::InvalidCard(_)
                | Self::UnknownPhase(_)
                | Self::ChipOverflow
        )
    }
}

pub type GameResult<T> = Result<T, GameError>;
