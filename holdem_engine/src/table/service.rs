//! Table operations over a storage collaborator.
//!
//! Each operation is one unit of work: load the aggregate, apply the change
//! to an in-memory copy, persist it. A rejected operation returns before
//! anything is written, so storage only ever holds committed states.
//!
//! These functions take no lock. Callers must serialize operations on the
//! same table, which [`super::TableActor`] does.

use log::{info, warn};
use rand::Rng;
use uuid::Uuid;

use super::{
    config::TableConfig,
    errors::{TableError, TableResult},
    views::TableView,
};
use crate::db::{
    records::{PlayerRecord, TableRecord, to_records},
    repository::TableRepository,
};
use crate::game::{
    Action, ActionKind, ActionOutcome, Chips, Game, GameError, Phase, SeatNumber, TableId, UserId,
};

/// Validates `config` and stores a fresh table in `STARTING`.
pub async fn create_table(
    repo: &dyn TableRepository,
    config: TableConfig,
) -> TableResult<TableRecord> {
    config.validate()?;
    let game = Game::new(Uuid::new_v4(), config);
    let record = TableRecord::from(&game);
    repo.insert_table(&record).await?;
    info!("Created table {} '{}'", game.id, game.config.name);
    Ok(record)
}

/// Seats a player and starts the hand once two players are sitting.
pub async fn seat_player<R: Rng + Send>(
    repo: &dyn TableRepository,
    rng: &mut R,
    table_id: TableId,
    user_id: UserId,
    seat_number: SeatNumber,
    buyin: Chips,
) -> TableResult<PlayerRecord> {
    let mut game = load_game(repo, table_id).await?;
    let phase_before = game.phase;
    let player = PlayerRecord::from(game.seat_player(user_id, seat_number, buyin, rng)?);

    if game.phase == phase_before {
        repo.add_player(&player).await?;
    } else {
        let (table, players) = to_records(&game);
        repo.add_player_and_save(&player, &table, &players).await?;
    }
    Ok(player)
}

/// Applies one player action and persists the result.
pub async fn act<R: Rng + Send>(
    repo: &dyn TableRepository,
    rng: &mut R,
    table_id: TableId,
    user_id: UserId,
    kind: ActionKind,
    amount: Option<Chips>,
) -> TableResult<ActionOutcome> {
    let action = Action::new(kind, amount)?;
    let mut game = load_game(repo, table_id).await?;

    let outcome = game.act(user_id, action, rng).inspect_err(|err| {
        if matches!(err, GameError::OutOfTurn) {
            warn!("Table {table_id}: user {user_id} tried to act out of turn");
        }
    })?;

    let (table, players) = to_records(&game);
    repo.save_aggregate(&table, &players).await?;
    Ok(outcome)
}

/// Sits a player out of, or back into, the next hand. Returns whether the
/// change started a hand.
pub async fn set_sitting_out<R: Rng + Send>(
    repo: &dyn TableRepository,
    rng: &mut R,
    table_id: TableId,
    user_id: UserId,
    sitting_out: bool,
) -> TableResult<bool> {
    let mut game = load_game(repo, table_id).await?;
    let started = game.set_sitting_out(user_id, sitting_out, rng)?;

    let (table, players) = to_records(&game);
    repo.save_aggregate(&table, &players).await?;
    Ok(started)
}

/// The table as `viewer` may see it.
pub async fn table_view(
    repo: &dyn TableRepository,
    table_id: TableId,
    viewer: Option<UserId>,
) -> TableResult<TableView> {
    let game = load_game(repo, table_id).await?;
    Ok(TableView::new(&game, viewer))
}

pub async fn list_tables(repo: &dyn TableRepository) -> TableResult<Vec<TableRecord>> {
    repo.list_tables().await
}

/// The player whose turn it is and the phase they are acting in.
pub async fn turn(
    repo: &dyn TableRepository,
    table_id: TableId,
) -> TableResult<Option<(UserId, Phase)>> {
    let game = load_game(repo, table_id).await?;
    Ok(game.active_player().map(|p| (p.user_id, game.phase)))
}

async fn load_game(repo: &dyn TableRepository, table_id: TableId) -> TableResult<Game> {
    let table = repo
        .load_table(table_id)
        .await?
        .ok_or(TableError::TableNotFound(table_id))?;
    let players = repo.load_players(table_id).await?;
    table.into_game(players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTableRepository;
    use crate::game::Applied;
    use async_trait::async_trait;
    use rand::{SeedableRng, rngs::StdRng};

    /// Storage whose table writes always fail; reads and plain player
    /// inserts go through.
    struct BrokenTableWrites(InMemoryTableRepository);

    fn write_failed() -> TableError {
        TableError::Database(sqlx::Error::PoolTimedOut)
    }

    #[async_trait]
    impl TableRepository for BrokenTableWrites {
        async fn insert_table(&self, table: &TableRecord) -> TableResult<()> {
            self.0.insert_table(table).await
        }

        async fn load_table(&self, table_id: TableId) -> TableResult<Option<TableRecord>> {
            self.0.load_table(table_id).await
        }

        async fn save_table(&self, _table: &TableRecord) -> TableResult<()> {
            Err(write_failed())
        }

        async fn list_tables(&self) -> TableResult<Vec<TableRecord>> {
            self.0.list_tables().await
        }

        async fn load_players(&self, table_id: TableId) -> TableResult<Vec<PlayerRecord>> {
            self.0.load_players(table_id).await
        }

        async fn save_players(&self, players: &[PlayerRecord]) -> TableResult<()> {
            self.0.save_players(players).await
        }

        async fn add_player(&self, player: &PlayerRecord) -> TableResult<()> {
            self.0.add_player(player).await
        }

        async fn add_player_and_save(
            &self,
            _player: &PlayerRecord,
            _table: &TableRecord,
            _players: &[PlayerRecord],
        ) -> TableResult<()> {
            Err(write_failed())
        }

        async fn save_aggregate(
            &self,
            _table: &TableRecord,
            _players: &[PlayerRecord],
        ) -> TableResult<()> {
            Err(write_failed())
        }
    }

    fn config() -> TableConfig {
        TableConfig {
            name: "TEST_TABLE".to_string(),
            seat_count: 6,
            small_blind: 25,
            big_blind: 50,
            min_buyin: 10_000,
            max_buyin: 20_000,
        }
    }

    async fn heads_up(repo: &InMemoryTableRepository, rng: &mut StdRng) -> TableId {
        let table = create_table(repo, config()).await.unwrap();
        seat_player(repo, rng, table.id, 1, 1, 10_000).await.unwrap();
        seat_player(repo, rng, table.id, 2, 2, 10_000).await.unwrap();
        table.id
    }

    // === Create Tests ===

    #[tokio::test]
    async fn test_create_table_stores_starting_table() {
        let repo = InMemoryTableRepository::new();
        let record = create_table(&repo, config()).await.unwrap();

        assert_eq!(record.phase, "STARTING");
        assert_eq!(record.pot_amount, 0);
        assert_eq!(repo.load_table(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_create_table_rejects_invalid_config() {
        let repo = InMemoryTableRepository::new();
        let result = create_table(
            &repo,
            TableConfig {
                big_blind: 25,
                ..config()
            },
        )
        .await;

        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
        assert_eq!(repo.write_count(), 0);
    }

    // === Seating Tests ===

    #[tokio::test]
    async fn test_first_player_waits() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(1);
        let table = create_table(&repo, config()).await.unwrap();

        let player = seat_player(&repo, &mut rng, table.id, 1, 3, 12_000)
            .await
            .unwrap();
        assert_eq!(player.stack, 12_000);
        assert_eq!(player.seat_number, 3);
        assert_eq!(player.hand, "");

        let stored = repo.load_table(table.id).await.unwrap().unwrap();
        assert_eq!(stored.phase, "STARTING");
    }

    #[tokio::test]
    async fn test_second_player_starts_hand() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(2);
        let table = create_table(&repo, config()).await.unwrap();
        seat_player(&repo, &mut rng, table.id, 1, 1, 10_000)
            .await
            .unwrap();

        let player = seat_player(&repo, &mut rng, table.id, 2, 2, 10_000)
            .await
            .unwrap();
        assert_eq!(player.position, Some(2));
        assert_eq!(player.current_bet, 50);
        assert_eq!(player.stack, 9_950);
        assert_eq!(player.hand.split(' ').count(), 2);

        let stored = repo.load_table(table.id).await.unwrap().unwrap();
        assert_eq!(stored.phase, "PREFLOP");
        assert_eq!(stored.deck.split(' ').count(), 48);
    }

    #[tokio::test]
    async fn test_seat_unknown_table() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(3);
        let missing = Uuid::new_v4();
        let result = seat_player(&repo, &mut rng, missing, 1, 1, 10_000).await;
        assert!(matches!(result, Err(TableError::TableNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_failed_hand_start_keeps_second_player_out() {
        let repo = BrokenTableWrites(InMemoryTableRepository::new());
        let mut rng = StdRng::seed_from_u64(11);
        let table = create_table(&repo, config()).await.unwrap();
        seat_player(&repo, &mut rng, table.id, 1, 1, 10_000)
            .await
            .unwrap();

        let result = seat_player(&repo, &mut rng, table.id, 2, 2, 10_000).await;
        assert!(matches!(result, Err(TableError::Database(_))));

        let stored = repo.load_table(table.id).await.unwrap().unwrap();
        assert_eq!(stored.phase, "STARTING");
        let players = repo.load_players(table.id).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].user_id, 1);
    }

    #[tokio::test]
    async fn test_create_table_rejects_unbounded_buyin() {
        let repo = InMemoryTableRepository::new();
        let result = create_table(
            &repo,
            TableConfig {
                seat_count: 2,
                max_buyin: 3_000_000_000,
                ..config()
            },
        )
        .await;

        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
        assert!(list_tables(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_seat_writes_nothing() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(4);
        let table = create_table(&repo, config()).await.unwrap();
        let writes = repo.write_count();

        let result = seat_player(&repo, &mut rng, table.id, 1, 7, 10_000).await;
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::InvalidSeat { seat: 7, .. }))
        ));
        let result = seat_player(&repo, &mut rng, table.id, 1, 1, 9_999).await;
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::BuyInTooSmall { .. }))
        ));

        assert_eq!(repo.write_count(), writes);
        assert!(repo.load_players(table.id).await.unwrap().is_empty());
    }

    // === Action Tests ===

    #[tokio::test]
    async fn test_call_then_check_reaches_flop() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(5);
        let table_id = heads_up(&repo, &mut rng).await;

        let outcome = act(&repo, &mut rng, table_id, 1, ActionKind::CheckOrCall, None)
            .await
            .unwrap();
        assert_eq!(outcome.applied, Applied::Called(25));
        assert_eq!(outcome.advanced_to, None);

        let outcome = act(&repo, &mut rng, table_id, 2, ActionKind::CheckOrCall, None)
            .await
            .unwrap();
        assert_eq!(outcome.applied, Applied::Checked);
        assert_eq!(outcome.advanced_to, Some(Phase::Flop));
        assert_eq!(outcome.pot_amount, 100);

        let stored = repo.load_table(table_id).await.unwrap().unwrap();
        assert_eq!(stored.phase, "FLOP");
        assert_eq!(stored.board.split(' ').count(), 3);
    }

    #[tokio::test]
    async fn test_bet_without_amount() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(6);
        let table_id = heads_up(&repo, &mut rng).await;

        let result = act(&repo, &mut rng, table_id, 1, ActionKind::Bet, None).await;
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::MissingBetAmount))
        ));
    }

    #[tokio::test]
    async fn test_rejected_action_leaves_storage_untouched() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(7);
        let table_id = heads_up(&repo, &mut rng).await;
        let before_table = repo.load_table(table_id).await.unwrap();
        let before_players = repo.load_players(table_id).await.unwrap();

        let result = act(&repo, &mut rng, table_id, 2, ActionKind::CheckOrCall, None).await;
        assert!(matches!(result, Err(TableError::Game(GameError::OutOfTurn))));

        let result = act(&repo, &mut rng, table_id, 1, ActionKind::Bet, Some(9_976)).await;
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::InsufficientStack { .. }))
        ));

        assert_eq!(repo.load_table(table_id).await.unwrap(), before_table);
        assert_eq!(repo.load_players(table_id).await.unwrap(), before_players);
    }

    #[tokio::test]
    async fn test_act_on_waiting_table() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(8);
        let table = create_table(&repo, config()).await.unwrap();
        seat_player(&repo, &mut rng, table.id, 1, 1, 10_000)
            .await
            .unwrap();

        let result = act(&repo, &mut rng, table.id, 1, ActionKind::CheckOrCall, None).await;
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::HandNotInProgress))
        ));
    }

    // === Sit Out Tests ===

    #[tokio::test]
    async fn test_sit_out_blocked_mid_hand() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(9);
        let table_id = heads_up(&repo, &mut rng).await;

        let result = set_sitting_out(&repo, &mut rng, table_id, 1, true).await;
        assert!(matches!(
            result,
            Err(TableError::Game(GameError::HandInProgress(Phase::Preflop)))
        ));
    }

    #[tokio::test]
    async fn test_sitting_in_starts_hand() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(10);
        let table = create_table(&repo, config()).await.unwrap();
        seat_player(&repo, &mut rng, table.id, 1, 1, 10_000)
            .await
            .unwrap();
        assert!(!set_sitting_out(&repo, &mut rng, table.id, 1, true).await.unwrap());
        seat_player(&repo, &mut rng, table.id, 2, 2, 10_000)
            .await
            .unwrap();
        assert_eq!(turn(&repo, table.id).await.unwrap(), None);

        assert!(set_sitting_out(&repo, &mut rng, table.id, 1, false).await.unwrap());
        assert_eq!(
            turn(&repo, table.id).await.unwrap(),
            Some((1, Phase::Preflop))
        );
    }

    // === View Tests ===

    #[tokio::test]
    async fn test_table_view_hides_other_hands() {
        let repo = InMemoryTableRepository::new();
        let mut rng = StdRng::seed_from_u64(12);
        let table_id = heads_up(&repo, &mut rng).await;

        let view = table_view(&repo, table_id, Some(2)).await.unwrap();
        assert!(view.player(1).unwrap().hand.is_none());
        assert_eq!(view.player(2).unwrap().hand.as_ref().map(Vec::len), Some(2));
        assert_eq!(list_tables(&repo).await.unwrap().len(), 1);
    }
}
