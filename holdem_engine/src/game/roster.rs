use serde::{Deserialize, Serialize};

use super::{
    entities::{Chips, Position, SeatNumber, UserId},
    errors::{GameError, GameResult},
    player::Player,
};

/// Players seated at one table, kept in ascending seat order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.seat_number);
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn insert(&mut self, player: Player) {
        let idx = self
            .players
            .partition_point(|p| p.seat_number < player.seat_number);
        self.players.insert(idx, player);
    }

    pub fn is_seat_taken(&self, seat: SeatNumber) -> bool {
        self.players.iter().any(|p| p.seat_number == seat)
    }

    pub fn player_by_user(&self, user_id: UserId) -> GameResult<&Player> {
        self.players
            .iter()
            .find(|p| p.user_id == user_id)
            .ok_or(GameError::PlayerNotFound(user_id))
    }

    pub fn player_by_user_mut(&mut self, user_id: UserId) -> GameResult<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or(GameError::PlayerNotFound(user_id))
    }

    /// Players taking part in hands, in seat order. This is the canonical
    /// turn order.
    pub fn sitting_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.sitting_out)
    }

    fn sitting_players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut().filter(|p| !p.sitting_out)
    }

    pub fn sitting_count(&self) -> usize {
        self.sitting_players().count()
    }

    /// Numbers sitting players 1..=k in seat order. Sitting-out players lose
    /// their position.
    pub fn assign_positions(&mut self) {
        let mut next: Position = 1;
        for player in &mut self.players {
            if player.sitting_out {
                player.position = None;
            } else {
                player.position = Some(next);
                next += 1;
            }
        }
    }

    pub fn player_at(&self, position: Position) -> GameResult<&Player> {
        self.sitting_players()
            .find(|p| p.position == Some(position))
            .ok_or(GameError::MissingPosition(position))
    }

    pub fn player_at_mut(&mut self, position: Position) -> GameResult<&mut Player> {
        self.sitting_players_mut()
            .find(|p| p.position == Some(position))
            .ok_or(GameError::MissingPosition(position))
    }

    pub fn small_blind(&self) -> GameResult<&Player> {
        self.player_at(1)
    }

    pub fn big_blind(&self) -> GameResult<&Player> {
        self.player_at(2)
    }

    /// The largest bet this round. Folded players count: their chips are
    /// already committed.
    pub fn highest_bet(&self) -> Chips {
        self.players.iter().map(|p| p.current_bet).max().unwrap_or(0)
    }

    pub fn all_have_acted(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.is_in_hand())
            .all(|p| p.has_acted)
    }

    pub fn bets_are_equal(&self) -> bool {
        let mut bets = self
            .players
            .iter()
            .filter(|p| p.is_in_hand())
            .map(|p| p.current_bet);
        match bets.next() {
            Some(first) => bets.all(|bet| bet == first),
            None => true,
        }
    }

    pub fn active_player(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_active)
    }

    /// Picks who acts first this round. With no bets out, position 1 leads.
    /// With bets out (the blinds), the player after the big blind leads,
    /// which is the small blind again when heads-up. Folded players are
    /// skipped in position order.
    pub fn set_initial_active(&mut self) -> GameResult<()> {
        for player in &mut self.players {
            player.is_active = false;
        }

        let no_bets = self.sitting_players().all(|p| p.current_bet == 0);
        let first = if no_bets || self.positioned_count() < 3 { 1 } else { 3 };

        let user_id = self
            .in_hand_from(first)
            .ok_or(GameError::MissingPosition(first))?;
        self.player_by_user_mut(user_id)?.is_active = true;
        Ok(())
    }

    /// Hands the turn from `user_id` to the next player still in the hand,
    /// in position order. The turn stays put when nobody else is left.
    pub fn pass_turn(&mut self, user_id: UserId) -> GameResult<()> {
        let position = self
            .player_by_user(user_id)?
            .position
            .ok_or(GameError::PlayerNotInHand(user_id))?;
        let count = self.positioned_count() as Position;
        let after = position % count + 1;

        let Some(next) = self.in_hand_from(after).filter(|&next| next != user_id) else {
            return Ok(());
        };
        self.player_by_user_mut(user_id)?.is_active = false;
        self.player_by_user_mut(next)?.is_active = true;
        Ok(())
    }

    /// Moves every current bet into the players' pot contributions and
    /// starts a fresh betting round. Returns the chips swept.
    pub fn sweep_bets(&mut self) -> GameResult<Chips> {
        let swept = self
            .players
            .iter()
            .try_fold(0, |total: Chips, p| total.checked_add(p.current_bet))
            .ok_or(GameError::ChipOverflow)?;
        for player in &mut self.players {
            player.amount_in_pot += player.current_bet;
            player.reset_for_new_round();
        }
        Ok(swept)
    }

    fn positioned_count(&self) -> usize {
        self.sitting_players()
            .filter(|p| p.position.is_some())
            .count()
    }

    /// First player still in the hand at or cyclically after `start`.
    fn in_hand_from(&self, start: Position) -> Option<UserId> {
        let count = self.positioned_count() as Position;
        if count == 0 {
            return None;
        }
        (0..count)
            .map(|offset| (start - 1 + offset) % count + 1)
            .filter_map(|position| self.player_at(position).ok())
            .find(|p| p.is_in_hand())
            .map(|p| p.user_id)
    }
}
