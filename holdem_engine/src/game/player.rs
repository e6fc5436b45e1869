use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, Chips, Position, SeatNumber, TableId, UserId},
    errors::{GameError, GameResult},
};

/// One seated participant and their betting state for the current hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub table_id: TableId,
    pub user_id: UserId,
    pub seat_number: SeatNumber,
    pub buyin: Chips,
    pub stack: Chips,
    /// Order in the current hand. `None` until a hand deals this player in.
    pub position: Option<Position>,
    /// Amount wagered this betting round.
    pub current_bet: Chips,
    /// Amount swept into the pot so far this hand.
    pub amount_in_pot: Chips,
    /// Whether it's this player's turn.
    pub is_active: bool,
    pub has_folded: bool,
    pub has_acted: bool,
    pub sitting_out: bool,
    pub hand: Vec<Card>,
}

impl Player {
    #[must_use]
    pub fn new(table_id: TableId, user_id: UserId, seat_number: SeatNumber, buyin: Chips) -> Self {
        Self {
            table_id,
            user_id,
            seat_number,
            buyin,
            stack: buyin,
            position: None,
            current_bet: 0,
            amount_in_pot: 0,
            is_active: false,
            has_folded: false,
            has_acted: false,
            sitting_out: false,
            hand: Vec::with_capacity(2),
        }
    }

    /// Moves `amount` from the stack into the current bet.
    pub fn bet(&mut self, amount: Chips) -> GameResult<()> {
        if amount > self.stack {
            return Err(GameError::InsufficientStack {
                stack: self.stack,
                amount,
            });
        }
        self.stack -= amount;
        self.current_bet += amount;
        Ok(())
    }

    pub fn fold(&mut self) {
        self.has_folded = true;
    }

    /// Clears per-round betting state. Must only run after the current bet
    /// has been swept into the pot.
    pub fn reset_for_new_round(&mut self) {
        self.current_bet = 0;
        self.has_acted = false;
    }

    /// Seated, not sitting out, and still contesting the hand.
    pub fn is_in_hand(&self) -> bool {
        !self.sitting_out && !self.has_folded
    }
}
