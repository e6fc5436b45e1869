//! Table actor implementation with async message handling.
//!
//! One actor owns each table. Messages are handled strictly one at a time,
//! so every load-mutate-save cycle in [`super::service`] sees the result of
//! the previous one.

use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Duration, Instant, MissedTickBehavior, interval},
};

use super::{
    config::ManagerConfig,
    errors::{TableError, TableResult},
    messages::TableMessage,
    service,
    views::TableView,
};
use crate::db::{records::PlayerRecord, repository::TableRepository};
use crate::game::{ActionKind, ActionOutcome, Chips, Phase, SeatNumber, TableId, UserId};

/// Table actor handle for sending messages
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> TableResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::TableClosed(self.table_id))
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<TableResult<T>>) -> TableMessage,
    ) -> TableResult<T> {
        let (response, reply) = oneshot::channel();
        self.send(message(response)).await?;
        reply
            .await
            .map_err(|_| TableError::TableClosed(self.table_id))?
    }

    pub async fn seat_player(
        &self,
        user_id: UserId,
        seat_number: SeatNumber,
        buyin: Chips,
    ) -> TableResult<PlayerRecord> {
        self.request(|response| TableMessage::SeatPlayer {
            user_id,
            seat_number,
            buyin,
            response,
        })
        .await
    }

    pub async fn act(
        &self,
        user_id: UserId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> TableResult<ActionOutcome> {
        self.request(|response| TableMessage::TakeAction {
            user_id,
            kind,
            amount,
            response,
        })
        .await
    }

    pub async fn set_sitting_out(&self, user_id: UserId, sitting_out: bool) -> TableResult<bool> {
        self.request(|response| TableMessage::SetSittingOut {
            user_id,
            sitting_out,
            response,
        })
        .await
    }

    pub async fn view(&self, viewer: Option<UserId>) -> TableResult<TableView> {
        self.request(|response| TableMessage::GetView { viewer, response })
            .await
    }

    /// Stop the actor after it finishes the messages already queued
    pub async fn close(&self) -> TableResult<()> {
        let (response, reply) = oneshot::channel();
        self.send(TableMessage::Close { response }).await?;
        reply
            .await
            .map_err(|_| TableError::TableClosed(self.table_id))
    }
}

/// Whose turn it is and since when.
#[derive(Debug, Clone, Copy)]
struct TurnClock {
    user_id: UserId,
    phase: Phase,
    started: Instant,
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Storage for the table aggregate
    repo: Arc<dyn TableRepository>,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Shuffles decks at hand start
    rng: StdRng,

    /// How long the active player may think; `None` disables the clock
    action_timeout: Option<Duration>,

    tick_interval: Duration,

    clock: Option<TurnClock>,

    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TableId,
        repo: Arc<dyn TableRepository>,
        config: &ManagerConfig,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);

        let actor = Self {
            id,
            repo,
            inbox,
            rng: StdRng::from_rng(&mut rand::rng()),
            action_timeout: (config.action_timeout_secs > 0)
                .then(|| Duration::from_secs(config.action_timeout_secs)),
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            clock: None,
            is_closed: false,
        };

        (actor, TableHandle::new(sender, id))
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} actor starting", self.id);

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.refresh_clock(false).await;

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => break,
                },

                _ = ticker.tick(), if self.action_timeout.is_some() => {
                    self.tick().await;
                }
            }

            if self.is_closed {
                break;
            }
        }

        log::info!("Table {} actor stopped", self.id);
    }

    /// Handle a table message
    async fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::SeatPlayer {
                user_id,
                seat_number,
                buyin,
                response,
            } => {
                let result = service::seat_player(
                    self.repo.as_ref(),
                    &mut self.rng,
                    self.id,
                    user_id,
                    seat_number,
                    buyin,
                )
                .await;
                self.log_failure(&result);
                if result.is_ok() {
                    self.refresh_clock(false).await;
                }
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                user_id,
                kind,
                amount,
                response,
            } => {
                let result = service::act(
                    self.repo.as_ref(),
                    &mut self.rng,
                    self.id,
                    user_id,
                    kind,
                    amount,
                )
                .await;
                self.log_failure(&result);
                if result.is_ok() {
                    self.refresh_clock(true).await;
                }
                let _ = response.send(result);
            }

            TableMessage::SetSittingOut {
                user_id,
                sitting_out,
                response,
            } => {
                let result = service::set_sitting_out(
                    self.repo.as_ref(),
                    &mut self.rng,
                    self.id,
                    user_id,
                    sitting_out,
                )
                .await;
                self.log_failure(&result);
                if result.is_ok() {
                    self.refresh_clock(false).await;
                }
                let _ = response.send(result);
            }

            TableMessage::GetView { viewer, response } => {
                let result = service::table_view(self.repo.as_ref(), self.id, viewer).await;
                self.log_failure(&result);
                let _ = response.send(result);
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    /// Rejected requests are the caller's problem; anything internal means
    /// the table or its storage is broken.
    fn log_failure<T>(&self, result: &TableResult<T>) {
        if let Err(e) = result
            && e.is_internal()
        {
            log::error!("Table {}: Error handling message: {}", self.id, e);
        }
    }

    /// Re-reads whose turn it is. The clock keeps running if the same
    /// player is still to act in the same phase, unless `restart` is set.
    async fn refresh_clock(&mut self, restart: bool) {
        if self.action_timeout.is_none() {
            return;
        }

        let turn = match service::turn(self.repo.as_ref(), self.id).await {
            Ok(turn) => turn,
            Err(e) => {
                log::error!("Table {}: Failed to read turn: {}", self.id, e);
                self.clock = None;
                return;
            }
        };

        self.clock = turn.map(|(user_id, phase)| match self.clock {
            Some(clock) if !restart && clock.user_id == user_id && clock.phase == phase => clock,
            _ => TurnClock {
                user_id,
                phase,
                started: Instant::now(),
            },
        });
    }

    /// Check-or-folds for a player whose time is up
    async fn tick(&mut self) {
        let (Some(timeout), Some(clock)) = (self.action_timeout, self.clock) else {
            return;
        };
        if clock.started.elapsed() < timeout {
            return;
        }

        log::warn!(
            "Table {}: user {} timed out in {}, auto check-or-fold",
            self.id,
            clock.user_id,
            clock.phase
        );
        let result = service::act(
            self.repo.as_ref(),
            &mut self.rng,
            self.id,
            clock.user_id,
            ActionKind::CheckOrFold,
            None,
        )
        .await;
        if let Err(e) = result {
            log::error!(
                "Table {}: Auto check-or-fold for user {} failed: {}",
                self.id,
                clock.user_id,
                e
            );
        }
        self.refresh_clock(true).await;
    }
}
