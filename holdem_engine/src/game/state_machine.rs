//! The table aggregate and its phase state machine.
//!
//! A [`Game`] owns everything that changes while a hand is played: the
//! roster, pot, board and deck. Every mutation goes through one of three
//! entry points (seating, sitting out, acting), each of which validates the
//! request before touching any state and then gives the state machine one
//! chance to advance the phase.

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    entities::{Action, Card, Chips, Deck, Phase, SeatNumber, TableId, UserId},
    errors::{GameError, GameResult},
    player::Player,
    roster::Roster,
};
use crate::table::config::TableConfig;

/// How an action ended up being applied.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Applied {
    Checked,
    Called(Chips),
    Folded,
    Bet(Chips),
}

/// Result of a successfully applied action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub applied: Applied,
    /// The phase entered because of this action, if any.
    pub advanced_to: Option<Phase>,
    pub phase: Phase,
    pub pot_amount: Chips,
    pub next_to_act: Option<UserId>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    pub id: TableId,
    pub config: TableConfig,
    pub phase: Phase,
    pub pot_amount: Chips,
    /// Community cards shared amongst all players.
    pub board: Vec<Card>,
    /// Undealt cards. Never leaves the server.
    pub deck: Deck,
    pub roster: Roster,
    pub created_at: DateTime<Utc>,
}

impl Game {
    /// A fresh table waiting for players. The config is assumed valid.
    #[must_use]
    pub fn new(id: TableId, config: TableConfig) -> Self {
        Self {
            id,
            config,
            phase: Phase::Starting,
            pot_amount: 0,
            board: Vec::with_capacity(5),
            deck: Deck::default(),
            roster: Roster::default(),
            // Storage keeps microseconds.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn active_player(&self) -> Option<&Player> {
        self.roster.active_player()
    }

    /// Seats a new player after checking the seat and buy-in, then starts
    /// the hand if enough players are sitting. Players seated while a hand
    /// is running sit out until the table is back to `Starting`.
    pub fn seat_player<R: Rng + ?Sized>(
        &mut self,
        user_id: UserId,
        seat_number: SeatNumber,
        buyin: Chips,
        rng: &mut R,
    ) -> GameResult<&Player> {
        if seat_number == 0 || seat_number > self.config.seat_count {
            return Err(GameError::InvalidSeat {
                seat: seat_number,
                seat_count: self.config.seat_count,
            });
        }
        if self.roster.is_seat_taken(seat_number) {
            return Err(GameError::SeatTaken(seat_number));
        }
        if self.roster.player_by_user(user_id).is_ok() {
            return Err(GameError::PlayerAlreadySeated(user_id));
        }
        if buyin < self.config.min_buyin {
            return Err(GameError::BuyInTooSmall {
                buyin,
                min_buyin: self.config.min_buyin,
            });
        }
        if buyin > self.config.max_buyin {
            return Err(GameError::BuyInTooLarge {
                buyin,
                max_buyin: self.config.max_buyin,
            });
        }

        let mut player = Player::new(self.id, user_id, seat_number, buyin);
        if self.phase != Phase::Starting {
            debug!(
                "Table {}: user {} seated mid-hand, sitting out",
                self.id, user_id
            );
            player.sitting_out = true;
        }
        self.roster.insert(player);
        info!(
            "Table {}: user {} took seat {} with {}",
            self.id, user_id, seat_number, buyin
        );

        self.advance(rng)?;
        self.roster.player_by_user(user_id)
    }

    /// Toggles a player's sitting-out flag. Only allowed between hands.
    /// Returns whether the toggle started a hand.
    pub fn set_sitting_out<R: Rng + ?Sized>(
        &mut self,
        user_id: UserId,
        sitting_out: bool,
        rng: &mut R,
    ) -> GameResult<bool> {
        if self.phase != Phase::Starting {
            return Err(GameError::HandInProgress(self.phase));
        }
        self.roster.player_by_user_mut(user_id)?.sitting_out = sitting_out;
        self.advance(rng)
    }

    /// Applies a player's action, passes the turn, and lets the state
    /// machine advance at most one phase.
    pub fn act<R: Rng + ?Sized>(
        &mut self,
        user_id: UserId,
        action: Action,
        rng: &mut R,
    ) -> GameResult<ActionOutcome> {
        let applied = self.apply_action(user_id, action)?;
        let advanced = self.advance(rng)?;

        Ok(ActionOutcome {
            applied,
            advanced_to: advanced.then_some(self.phase),
            phase: self.phase,
            pot_amount: self.pot_amount,
            next_to_act: self.active_player().map(|p| p.user_id),
        })
    }

    /// The betting half of [`Game::act`]: validates and applies the action
    /// and passes the turn, without running the transition check.
    pub fn apply_action(&mut self, user_id: UserId, action: Action) -> GameResult<Applied> {
        if !self.phase.is_betting() {
            return Err(GameError::HandNotInProgress);
        }
        let highest_bet = self.roster.highest_bet();
        let player = self.roster.player_by_user_mut(user_id)?;
        if !player.is_in_hand() {
            return Err(GameError::PlayerNotInHand(user_id));
        }
        if !player.is_active {
            return Err(GameError::OutOfTurn);
        }

        let to_call = highest_bet.saturating_sub(player.current_bet);
        let applied = match action {
            Action::CheckOrCall if to_call > 0 => {
                player.bet(to_call)?;
                Applied::Called(to_call)
            }
            Action::CheckOrFold if to_call > 0 => {
                player.fold();
                Applied::Folded
            }
            Action::CheckOrCall | Action::CheckOrFold => Applied::Checked,
            Action::Bet(amount) => {
                player.bet(amount)?;
                Applied::Bet(amount)
            }
        };
        player.has_acted = true;
        debug!("Table {}: user {} {}", self.id, user_id, action);

        self.roster.pass_turn(user_id)?;
        Ok(applied)
    }

    /// The current betting round is over: everyone still in the hand has
    /// acted and matched the same bet.
    pub fn is_end_of_round(&self) -> bool {
        self.phase.is_betting() && self.roster.all_have_acted() && self.roster.bets_are_equal()
    }

    /// Runs one transition check. Returns whether the phase changed.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameResult<bool> {
        match self.phase {
            Phase::Starting if self.roster.sitting_count() >= 2 => {
                self.start_hand(rng)?;
                Ok(true)
            }
            phase if self.is_end_of_round() => match phase.next_street() {
                Some((next, num_cards)) => {
                    self.deal_street(next, num_cards)?;
                    Ok(true)
                }
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn start_hand<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameResult<()> {
        let mut deck = Deck::default();
        deck.shuffle(rng);

        let mut roster = self.roster.clone();
        roster.assign_positions();
        roster.player_at_mut(1)?.bet(self.config.small_blind)?;
        roster.player_at_mut(2)?.bet(self.config.big_blind)?;

        // One card to each player in seat order, then a second round.
        let seated: Vec<UserId> = roster.sitting_players().map(|p| p.user_id).collect();
        let num_players = seated.len();
        let cards = deck.deal_top(2 * num_players)?;
        let (first, second) = cards.split_at(num_players);
        for (i, &user_id) in seated.iter().enumerate() {
            roster.player_by_user_mut(user_id)?.hand = vec![first[i], second[i]];
        }
        roster.set_initial_active()?;

        self.roster = roster;
        self.deck = deck;
        self.board.clear();
        self.pot_amount = 0;
        self.phase = Phase::Preflop;
        info!(
            "Table {}: hand started with {} players",
            self.id, num_players
        );
        Ok(())
    }

    fn deal_street(&mut self, next: Phase, num_cards: usize) -> GameResult<()> {
        let cards = self.deck.deal_top(num_cards)?;
        let swept = self.roster.sweep_bets()?;
        self.pot_amount = self
            .pot_amount
            .checked_add(swept)
            .ok_or(GameError::ChipOverflow)?;
        self.board.extend(cards);
        self.roster.set_initial_active()?;
        self.phase = next;
        info!(
            "Table {}: {} dealt, pot {}",
            self.id, self.phase, self.pot_amount
        );
        Ok(())
    }
}
