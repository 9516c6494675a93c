//! Tic-Tac-Toe
//!
//! Unstaked two-player board game. The creator plays X and moves first.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::ledger::{Registry, TxContext};

/// Winning lines on the 3x3 board, cells numbered 0-8 row by row.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mark {
    /// Empty.
    Empty,
    /// Creator.
    X,
    /// Joiner.
    O,
}

/// Board game lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardStatus {
    /// Waiting for the second player.
    Waiting,
    /// In progress.
    Playing,
    /// Someone completed a line.
    Won,
    /// Board full without a line.
    Draw,
}

/// One board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeGame {
    /// Identifier.
    pub id: u64,
    /// X player (creator).
    pub player_x: AccountId,
    /// O player.
    pub player_o: Option<AccountId>,
    /// Cells 0-8.
    pub board: [Mark; 9],
    /// Mark to move next.
    pub turn: Mark,
    /// Status.
    pub status: BoardStatus,
    /// Winner once `Won`.
    pub winner: Option<AccountId>,
}

impl TicTacToeGame {
    /// Numeric status: 0 waiting, 1 playing, 2 won, 3 draw.
    pub fn status_code(&self) -> u8 {
        match self.status {
            BoardStatus::Waiting => 0,
            BoardStatus::Playing => 1,
            BoardStatus::Won => 2,
            BoardStatus::Draw => 3,
        }
    }

    fn has_line(&self, mark: Mark) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|cell| self.board[*cell] == mark))
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.id);
        hasher.update_account(&self.player_x);
        hasher.update_opt_account(self.player_o.as_ref());
        for cell in &self.board {
            hasher.update_u8(*cell as u8);
        }
        hasher.update_u8(self.turn as u8);
        hasher.update_u8(self.status_code());
        hasher.update_opt_account(self.winner.as_ref());
    }
}

/// All boards.
#[derive(Clone, Debug)]
pub struct TicTacToeTable {
    games: Registry<TicTacToeGame>,
}

impl Default for TicTacToeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            games: Registry::new("board"),
        }
    }

    /// Look up a board.
    pub fn get(&self, id: u64) -> Option<&TicTacToeGame> {
        self.games.get(id)
    }

    /// Open a board as X.
    pub fn create(&mut self, tx: &TxContext<'_>) -> u64 {
        let player_x = tx.caller;
        let id = self.games.allocate(|id| TicTacToeGame {
            id,
            player_x,
            player_o: None,
            board: [Mark::Empty; 9],
            turn: Mark::X,
            status: BoardStatus::Waiting,
            winner: None,
        });
        info!(board_id = id, player_x = %player_x.short(), "Board created");
        id
    }

    /// Take the O seat.
    pub fn join(&mut self, tx: &TxContext<'_>, id: u64) -> ArcadeResult<()> {
        let game = self.games.require_mut(id)?;
        if game.status != BoardStatus::Waiting {
            return Err(ArcadeError::WrongState("board already has two players"));
        }
        if tx.caller == game.player_x {
            return Err(ArcadeError::AlreadyJoined);
        }
        game.player_o = Some(tx.caller);
        game.status = BoardStatus::Playing;
        info!(board_id = id, player_o = %tx.caller.short(), "Board joined");
        Ok(())
    }

    /// Place the caller's mark. Returns the new status.
    pub fn play(&mut self, tx: &TxContext<'_>, id: u64, cell: u64) -> ArcadeResult<BoardStatus> {
        let game = self.games.require_mut(id)?;
        if game.status != BoardStatus::Playing {
            return Err(ArcadeError::WrongState("board is not in play"));
        }
        let mark = if tx.caller == game.player_x {
            Mark::X
        } else if game.player_o == Some(tx.caller) {
            Mark::O
        } else {
            return Err(ArcadeError::Unauthorized);
        };
        if mark != game.turn {
            return Err(ArcadeError::NotYourTurn);
        }
        if cell > 8 {
            return Err(ArcadeError::OutOfRange { field: "cell", value: cell, max: 8 });
        }
        let cell = cell as usize;
        if game.board[cell] != Mark::Empty {
            return Err(ArcadeError::CellOccupied);
        }

        game.board[cell] = mark;
        if game.has_line(mark) {
            game.status = BoardStatus::Won;
            game.winner = Some(tx.caller);
            info!(board_id = id, winner = %tx.caller.short(), "Board won");
        } else if game.board.iter().all(|c| *c != Mark::Empty) {
            game.status = BoardStatus::Draw;
            info!(board_id = id, "Board drawn");
        } else {
            game.turn = if mark == Mark::X { Mark::O } else { Mark::X };
        }
        Ok(game.status)
    }

    /// Fold the table into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.games.next_id());
        for (_, game) in self.games.iter() {
            game.hash_into(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::LedgerClock;
    use crate::core::rng::FixedSeed;
    use crate::ledger::EscrowLedger;

    struct Seat {
        escrow: EscrowLedger,
        seed: FixedSeed,
        clock: LedgerClock,
    }

    impl Seat {
        fn new() -> Self {
            Self { escrow: EscrowLedger::new(), seed: FixedSeed(0), clock: LedgerClock::default() }
        }

        fn as_player(&mut self, label: &str) -> TxContext<'_> {
            TxContext {
                caller: AccountId::from_label(label),
                height: 0,
                clock: &self.clock,
                escrow: &mut self.escrow,
                randomness: &self.seed,
            }
        }
    }

    fn started(seat: &mut Seat, table: &mut TicTacToeTable) -> u64 {
        let id = table.create(&seat.as_player("wallet_1"));
        table.join(&seat.as_player("wallet_2"), id).unwrap();
        id
    }

    #[test]
    fn test_full_game_with_winner() {
        let mut seat = Seat::new();
        let mut table = TicTacToeTable::new();
        let id = started(&mut seat, &mut table);

        for (player, cell) in [("wallet_1", 0), ("wallet_2", 3), ("wallet_1", 1), ("wallet_2", 4)] {
            assert_eq!(table.play(&seat.as_player(player), id, cell).unwrap(), BoardStatus::Playing);
        }
        let status = table.play(&seat.as_player("wallet_1"), id, 2).unwrap();
        assert_eq!(status, BoardStatus::Won);

        let game = table.get(id).unwrap();
        assert_eq!(game.status_code(), 2);
        assert_eq!(game.winner, Some(AccountId::from_label("wallet_1")));
    }

    #[test]
    fn test_wrong_turn_and_occupied_cell() {
        let mut seat = Seat::new();
        let mut table = TicTacToeTable::new();
        let id = started(&mut seat, &mut table);

        let wrong = table.play(&seat.as_player("wallet_2"), id, 0).unwrap_err();
        assert_eq!(wrong.code(), 402);

        table.play(&seat.as_player("wallet_1"), id, 0).unwrap();
        let taken = table.play(&seat.as_player("wallet_2"), id, 0).unwrap_err();
        assert_eq!(taken.code(), 403);
    }

    #[test]
    fn test_draw() {
        let mut seat = Seat::new();
        let mut table = TicTacToeTable::new();
        let id = started(&mut seat, &mut table);

        // X O X / X O O / O X X
        let moves = [0, 1, 2, 4, 3, 5, 7, 6, 8];
        let mut last = BoardStatus::Playing;
        for (i, cell) in moves.iter().enumerate() {
            let player = if i % 2 == 0 { "wallet_1" } else { "wallet_2" };
            last = table.play(&seat.as_player(player), id, *cell).unwrap();
        }
        assert_eq!(last, BoardStatus::Draw);
        assert_eq!(table.get(id).unwrap().winner, None);
    }

    #[test]
    fn test_outsider_and_bad_cell() {
        let mut seat = Seat::new();
        let mut table = TicTacToeTable::new();
        let id = started(&mut seat, &mut table);

        assert_eq!(
            table.play(&seat.as_player("wallet_3"), id, 4),
            Err(ArcadeError::Unauthorized)
        );
        assert!(matches!(
            table.play(&seat.as_player("wallet_1"), id, 9),
            Err(ArcadeError::OutOfRange { .. })
        ));
    }
}
