//! Table actor message types.

use tokio::sync::oneshot;

use super::{errors::TableResult, views::TableView};
use crate::db::records::PlayerRecord;
use crate::game::{ActionKind, ActionOutcome, Chips, SeatNumber, UserId};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Take a seat with a buy-in
    SeatPlayer {
        user_id: UserId,
        seat_number: SeatNumber,
        buyin: Chips,
        response: oneshot::Sender<TableResult<PlayerRecord>>,
    },

    /// Player action (check/call, check/fold, bet)
    TakeAction {
        user_id: UserId,
        kind: ActionKind,
        amount: Option<Chips>,
        response: oneshot::Sender<TableResult<ActionOutcome>>,
    },

    /// Sit out of, or back into, the next hand
    SetSittingOut {
        user_id: UserId,
        sitting_out: bool,
        response: oneshot::Sender<TableResult<bool>>,
    },

    /// Get the table as seen by a user, or by a spectator when `None`
    GetView {
        viewer: Option<UserId>,
        response: oneshot::Sender<TableResult<TableView>>,
    },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },
}
