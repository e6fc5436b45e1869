//! What a single client is allowed to see of a table.

use serde::{Deserialize, Serialize};

use super::config::TableConfig;
use crate::game::{
    Card, Chips, Game, Phase, Player, SeatNumber, TableId, UserId, entities::Position,
};

/// A seated player as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub user_id: UserId,
    pub seat_number: SeatNumber,
    pub stack: Chips,
    pub position: Option<Position>,
    pub current_bet: Chips,
    pub amount_in_pot: Chips,
    pub is_active: bool,
    pub has_folded: bool,
    pub sitting_out: bool,
    /// Hole cards, only present for the viewer's own seat
    pub hand: Option<Vec<Card>>,
}

/// A table as seen by one viewer. Never includes the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub id: TableId,
    pub config: TableConfig,
    pub phase: Phase,
    pub pot_amount: Chips,
    pub board: Vec<Card>,
    pub players: Vec<PlayerView>,
    pub next_to_act: Option<UserId>,
}

impl PlayerView {
    fn new(player: &Player, viewer: Option<UserId>) -> Self {
        let own_seat = viewer == Some(player.user_id);
        Self {
            user_id: player.user_id,
            seat_number: player.seat_number,
            stack: player.stack,
            position: player.position,
            current_bet: player.current_bet,
            amount_in_pot: player.amount_in_pot,
            is_active: player.is_active,
            has_folded: player.has_folded,
            sitting_out: player.sitting_out,
            hand: (own_seat && !player.hand.is_empty()).then(|| player.hand.clone()),
        }
    }
}

impl TableView {
    /// Builds the view of `game` for `viewer`; `None` views as a spectator.
    pub fn new(game: &Game, viewer: Option<UserId>) -> Self {
        Self {
            id: game.id,
            config: game.config.clone(),
            phase: game.phase,
            pot_amount: game.pot_amount,
            board: game.board.clone(),
            players: game
                .roster
                .players()
                .iter()
                .map(|p| PlayerView::new(p, viewer))
                .collect(),
            next_to_act: game.active_player().map(|p| p.user_id),
        }
    }

    pub fn player(&self, user_id: UserId) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.user_id == user_id)
    }
}
