//! Arcade Engine
//!
//! Owns every table, the escrow ledger and the clock, and executes one
//! operation at a time in the order the ledger log presents them.
//!
//! ```text
//!   caller, Operation
//!         │
//!         ▼
//!   ┌──────────────┐  TxContext   ┌──────────────────────────────┐
//!   │   execute    │─────────────►│ wager tables · hot potato    │
//!   │ (one at a    │              │ tic-tac-toe · lottery ·      │
//!   │  time)       │◄─────────────│ tournaments · cosmetics ·    │
//!   └──────────────┘  Result      │ scoreboard · tasks           │
//!         │                       └──────────────────────────────┘
//!         ▼
//!   state hash → Transcript entry → Receipt
//! ```
//!
//! The host drives the ledger around the operations: it credits accounts
//! and seals blocks with a beacon the operation log cannot predict. Both
//! are recorded so a replay reproduces them at the same position.
//!
//! Every table validates before it mutates, so a rejected operation leaves
//! the state hash exactly where it was and can be resubmitted safely.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::access::{Cosmetics, Lottery, Scoreboard, TaskList, TournamentParams, TournamentTable};
use crate::config::{ArcadeConfig, ConfigError};
use crate::core::clock::{Clock, LedgerClock};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::ids::AccountId;
use crate::core::rng::RandomnessSource;
use crate::engine::events::{OpOutput, Receipt};
use crate::engine::ops::{AdminTable, Operation};
use crate::error::{ArcadeError, ArcadeResult};
use crate::game::{GameVariant, HotPotatoTable, TicTacToeTable, WagerGame, WagerTable};
use crate::ledger::{EscrowLedger, TxContext};
use crate::proof::transcript::{Transcript, TranscriptEntry};

/// Most blocks a single `advance` may mine.
pub const MAX_ADVANCE_BLOCKS: u64 = 10_000;

/// The whole engine state.
pub struct Arcade {
    config: ArcadeConfig,
    clock: LedgerClock,
    escrow: EscrowLedger,
    wagers: BTreeMap<GameVariant, WagerTable>,
    hot_potato: HotPotatoTable,
    tic_tac_toe: TicTacToeTable,
    scoreboard: Scoreboard,
    lottery: Lottery,
    tournaments: TournamentTable,
    cosmetics: Cosmetics,
    tasks: TaskList,
    randomness: Box<dyn RandomnessSource>,
    transcript: Transcript,
}

impl Arcade {
    /// Build an engine from a validated config, seeding genesis balances
    /// and the house bankroll.
    pub fn new(config: ArcadeConfig, randomness: Box<dyn RandomnessSource>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut escrow = EscrowLedger::new();
        for (account, amount) in config.genesis_accounts() {
            escrow
                .credit(account, amount)
                .map_err(|_| ConfigError::Invalid("genesis balances overflow"))?;
        }
        escrow
            .credit_house(config.house_bankroll)
            .map_err(|_| ConfigError::Invalid("house bankroll overflows"))?;

        let wagers = GameVariant::ALL
            .iter()
            .map(|variant| (*variant, WagerTable::new(variant.policy(&config))))
            .collect();

        let mut arcade = Self {
            clock: LedgerClock::new(config.start_height),
            escrow,
            wagers,
            hot_potato: HotPotatoTable::new(config.hot_potato_timer),
            tic_tac_toe: TicTacToeTable::new(),
            scoreboard: Scoreboard::new(config.admin),
            lottery: Lottery::new(config.admin),
            tournaments: TournamentTable::new(config.admin, config.top3_split_bps),
            cosmetics: Cosmetics::new(config.admin),
            tasks: TaskList::new(),
            transcript: Transcript::new(config.clone(), randomness.name(), [0; 32]),
            randomness,
            config,
        };
        arcade.transcript.genesis_hash = arcade.state_hash();

        info!(
            height = arcade.clock.height(),
            randomness = arcade.randomness.name(),
            house = arcade.escrow.house_balance(),
            accounts = arcade.config.genesis_balances.len(),
            "Arcade engine started"
        );
        Ok(arcade)
    }

    /// Credit an account from outside the engine (bridge deposit, test
    /// funding). Recorded in the transcript so replays reproduce it.
    pub fn credit(&mut self, account: AccountId, amount: u64) -> ArcadeResult<u64> {
        let balance = self.escrow.credit(account, amount)?;
        self.transcript.record_credit(account, amount);
        debug!(account = %account.short(), amount, balance, "host credit");
        Ok(balance)
    }

    /// Seal the next block with a beacon supplied by the host, such as the
    /// settlement chain's block hash. Draws read only sealed headers.
    pub fn seal_block(&mut self, beacon: StateHash) -> u64 {
        let height = self.clock.seal(&beacon);
        self.transcript.record_block(beacon);
        debug!(height, beacon = %hex::encode(beacon), "block sealed");
        height
    }

    /// Execute one operation and record it.
    pub fn execute(&mut self, caller: AccountId, op: Operation) -> ArcadeResult<OpOutput> {
        let seq = self.transcript.len() as u64;
        let height = self.clock.height();
        let result = self.apply(caller, &op);

        if let Err(err) = &result {
            debug!(
                seq,
                caller = %caller.short(),
                action = op.name(),
                kind = ?err.kind(),
                code = err.code(),
                "operation rejected: {}",
                err
            );
        }

        let code = result.as_ref().err().map(ArcadeError::code).unwrap_or(0);
        let state_hash = self.state_hash();

        let mut digest = StateHasher::for_operation();
        digest.update_u64(seq);
        digest.update_account(&caller);
        digest.update_u32(code);
        digest.update_bytes(&state_hash);
        self.clock.record(&digest.finalize());

        self.transcript.record(TranscriptEntry {
            seq,
            height,
            caller,
            op,
            code,
            state_hash,
        });
        result
    }

    /// Execute one operation and describe the outcome as a receipt.
    pub fn submit(&mut self, caller: AccountId, op: Operation) -> Receipt {
        let seq = self.transcript.len() as u64;
        let height = self.clock.height();
        let action = op.name();
        let result = self.execute(caller, op);
        Receipt::new(seq, height, caller, action, &result, self.transcript.final_hash())
    }

    fn apply(&mut self, caller: AccountId, op: &Operation) -> ArcadeResult<OpOutput> {
        let mut tx = TxContext {
            caller,
            height: self.clock.height(),
            clock: &self.clock,
            escrow: &mut self.escrow,
            randomness: self.randomness.as_ref(),
        };
        let wagers = &mut self.wagers;

        match op {
            Operation::FundHouse { amount } => {
                let house = tx.escrow.fund_house(caller, *amount)?;
                info!(from = %caller.short(), amount, house, "House funded");
                Ok(OpOutput::Amount(house))
            }
            Operation::Advance { blocks } => {
                if *blocks == 0 || *blocks > MAX_ADVANCE_BLOCKS {
                    return Err(ArcadeError::OutOfRange {
                        field: "blocks",
                        value: *blocks,
                        max: MAX_ADVANCE_BLOCKS,
                    });
                }
                // `tx` is dead on this path, releasing its borrow of the clock.
                let height = self.clock.advance(*blocks);
                debug!(blocks, height, "blocks mined");
                Ok(OpOutput::Height(height))
            }
            Operation::GetBalance { account } => Ok(OpOutput::Amount(tx.escrow.balance(account))),
            Operation::GetHouseBalance => Ok(OpOutput::Amount(tx.escrow.house_balance())),

            Operation::CreateGame { variant, stake, commitment } => wager_table(wagers, *variant)?
                .create(&mut tx, *stake, *commitment)
                .map(OpOutput::Created),
            Operation::JoinGame { variant, id, commitment } => wager_table(wagers, *variant)?
                .join(&mut tx, *id, *commitment)
                .map(|()| OpOutput::Done),
            Operation::Reveal { variant, id, choices, secret } => wager_table(wagers, *variant)?
                .reveal(&mut tx, *id, choices, secret)
                .map(OpOutput::Reveal),
            Operation::ExpireGame { variant, id } => wager_table(wagers, *variant)?
                .expire(&mut tx, *id)
                .map(OpOutput::Expired),
            Operation::CancelGame { variant, id } => wager_table(wagers, *variant)?
                .cancel(&mut tx, *id)
                .map(|()| OpOutput::Done),
            Operation::GetGame { variant, id } => Ok(OpOutput::Game(
                wagers.get(variant).and_then(|table| table.get(*id)).cloned(),
            )),

            Operation::CreatePotato { stake } => {
                self.hot_potato.create(&mut tx, *stake).map(OpOutput::Created)
            }
            Operation::TakePotato { id } => self.hot_potato.take(&mut tx, *id).map(|()| OpOutput::Done),
            Operation::SettlePotato { id } => self.hot_potato.settle(&mut tx, *id).map(OpOutput::Winner),
            Operation::CancelPotato { id } => {
                self.hot_potato.cancel(&mut tx, *id).map(|()| OpOutput::Done)
            }
            Operation::GetPotato { id } => Ok(OpOutput::Potato(self.hot_potato.get(*id).cloned())),

            Operation::CreateBoard => Ok(OpOutput::Created(self.tic_tac_toe.create(&tx))),
            Operation::JoinBoard { id } => self.tic_tac_toe.join(&tx, *id).map(|()| OpOutput::Done),
            Operation::Play { id, cell } => self.tic_tac_toe.play(&tx, *id, *cell).map(OpOutput::Board),
            Operation::GetBoard { id } => Ok(OpOutput::TicTacToe(self.tic_tac_toe.get(*id).cloned())),

            Operation::InitAdmin { table } => {
                match table {
                    AdminTable::Scoreboard => self.scoreboard.init_admin(caller),
                    AdminTable::Lottery => self.lottery.init_admin(caller),
                    AdminTable::Tournament => self.tournaments.init_admin(caller),
                    AdminTable::Cosmetics => self.cosmetics.init_admin(caller),
                }
                .map(|()| OpOutput::Done)
            }

            Operation::SetScore { player, value } => {
                self.scoreboard.set(&caller, *player, *value).map(OpOutput::Amount)
            }
            Operation::AddScore { player, delta } => {
                self.scoreboard.add(&caller, *player, *delta).map(OpOutput::Amount)
            }
            Operation::GetScore { player } => Ok(OpOutput::Amount(self.scoreboard.get(player))),

            Operation::CreateRound { ticket_price, duration } => self
                .lottery
                .create_round(&tx, *ticket_price, *duration)
                .map(OpOutput::Created),
            Operation::BuyTicket { round_id } => {
                self.lottery.buy_ticket(&mut tx, *round_id).map(OpOutput::Created)
            }
            Operation::Draw { round_id } => self.lottery.draw(&mut tx, *round_id).map(OpOutput::Drawn),
            Operation::CancelRound { round_id } => {
                self.lottery.cancel_round(&tx, *round_id).map(|()| OpOutput::Done)
            }
            Operation::GetRound { round_id } => Ok(OpOutput::Round(self.lottery.get(*round_id).cloned())),

            Operation::CreateTournament {
                entry_fee,
                max_players,
                start_height,
                end_height,
                winners_count,
            } => {
                let params = TournamentParams {
                    entry_fee: *entry_fee,
                    max_players: *max_players,
                    start_height: *start_height,
                    end_height: *end_height,
                    winners_count: *winners_count,
                };
                self.tournaments.create(&tx, params).map(OpOutput::Created)
            }
            Operation::JoinTournament { id } => {
                self.tournaments.join(&mut tx, *id).map(|()| OpOutput::Done)
            }
            Operation::LockTournament { id } => self.tournaments.lock(&tx, *id).map(|()| OpOutput::Done),
            Operation::CancelTournament { id } => {
                self.tournaments.cancel(&tx, *id).map(|()| OpOutput::Done)
            }
            Operation::ClaimRefund { id } => {
                self.tournaments.claim_refund(&mut tx, *id).map(OpOutput::Amount)
            }
            Operation::SettleSingle { id, winner } => self
                .tournaments
                .settle_single(&mut tx, *id, *winner)
                .map(OpOutput::Prizes),
            Operation::SettleTop3 { id, first, second, third } => self
                .tournaments
                .settle_top3(&mut tx, *id, [*first, *second, *third])
                .map(OpOutput::Prizes),
            Operation::GetTournament { id } => {
                Ok(OpOutput::Tournament(self.tournaments.get(*id).cloned()))
            }

            Operation::CreateDrop { category, skin, max_supply, required_badge } => self
                .cosmetics
                .create_drop(&caller, *category, *skin, *max_supply, *required_badge)
                .map(OpOutput::Created),
            Operation::SetDropUri { id, uri } => self
                .cosmetics
                .set_drop_uri(&caller, *id, uri.clone())
                .map(|()| OpOutput::Done),
            Operation::SetDropActive { id, active } => self
                .cosmetics
                .set_drop_active(&caller, *id, *active)
                .map(|()| OpOutput::Done),
            Operation::SetClaimSigner { public_key } => self
                .cosmetics
                .set_claim_signer(&caller, *public_key)
                .map(|()| OpOutput::Done),
            Operation::GrantBadge { player, badge } => self
                .cosmetics
                .grant_badge(&caller, *player, *badge)
                .map(|()| OpOutput::Done),
            Operation::ClaimDrop { id } => self.cosmetics.claim_drop(caller, *id).map(OpOutput::Created),
            Operation::ClaimWithPermit { id, nonce, signature } => self
                .cosmetics
                .claim_with_permit(caller, *id, *nonce, signature)
                .map(OpOutput::Created),
            Operation::Transfer { token_id, from, to } => self
                .cosmetics
                .transfer(&caller, *token_id, *from, *to)
                .map(|()| OpOutput::Done),
            Operation::GetDrop { id } => Ok(OpOutput::Drop(self.cosmetics.get_drop(*id).cloned())),
            Operation::GetToken { id } => Ok(OpOutput::Token(self.cosmetics.get_token(*id).cloned())),
            Operation::GetTokenUri { id } => Ok(OpOutput::Uri(
                self.cosmetics.get_token_uri(*id).map(str::to_string),
            )),
            Operation::GetBadge { player, badge } => {
                Ok(OpOutput::Flag(self.cosmetics.get_badge(player, *badge)))
            }

            Operation::CreateTask => Ok(OpOutput::Created(self.tasks.create_task(caller))),
            Operation::SetCompleted { id, completed } => self
                .tasks
                .set_completed(&caller, *id, *completed)
                .map(OpOutput::Flag),
            Operation::GetTask { id } => Ok(OpOutput::Task(self.tasks.get_task(*id).cloned())),
            Operation::DeleteTask { id } => self.tasks.delete_task(&caller, *id).map(|()| OpOutput::Done),
        }
    }

    /// Hash of the complete engine state.
    pub fn state_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_arcade_state();
        self.clock.hash_into(&mut hasher);
        self.escrow.hash_into(&mut hasher);
        for table in self.wagers.values() {
            table.hash_into(&mut hasher);
        }
        self.hot_potato.hash_into(&mut hasher);
        self.tic_tac_toe.hash_into(&mut hasher);
        self.scoreboard.hash_into(&mut hasher);
        self.lottery.hash_into(&mut hasher);
        self.tournaments.hash_into(&mut hasher);
        self.cosmetics.hash_into(&mut hasher);
        self.tasks.hash_into(&mut hasher);
        hasher.finalize()
    }

    /// Configuration in force.
    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    /// Current ledger height.
    pub fn height(&self) -> u64 {
        self.clock.height()
    }

    /// Ledger clock, for inspection.
    pub fn clock(&self) -> &LedgerClock {
        &self.clock
    }

    /// Spendable balance of an account.
    pub fn balance(&self, account: &AccountId) -> u64 {
        self.escrow.balance(account)
    }

    /// House pool balance.
    pub fn house_balance(&self) -> u64 {
        self.escrow.house_balance()
    }

    /// Escrow ledger, for inspection.
    pub fn escrow(&self) -> &EscrowLedger {
        &self.escrow
    }

    /// Wager table of a variant.
    pub fn wagers(&self, variant: GameVariant) -> Option<&WagerTable> {
        self.wagers.get(&variant)
    }

    /// Wager game lookup.
    pub fn game(&self, variant: GameVariant, id: u64) -> Option<&WagerGame> {
        self.wagers.get(&variant).and_then(|table| table.get(id))
    }

    /// Hot-potato table.
    pub fn hot_potato(&self) -> &HotPotatoTable {
        &self.hot_potato
    }

    /// Tic-tac-toe table.
    pub fn tic_tac_toe(&self) -> &TicTacToeTable {
        &self.tic_tac_toe
    }

    /// Scoreboard.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Lottery rounds.
    pub fn lottery(&self) -> &Lottery {
        &self.lottery
    }

    /// Tournaments.
    pub fn tournaments(&self) -> &TournamentTable {
        &self.tournaments
    }

    /// Cosmetics.
    pub fn cosmetics(&self) -> &Cosmetics {
        &self.cosmetics
    }

    /// Task list.
    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Operations executed so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consume the engine, keeping its transcript.
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}

fn wager_table(
    wagers: &mut BTreeMap<GameVariant, WagerTable>,
    variant: GameVariant,
) -> ArcadeResult<&mut WagerTable> {
    wagers
        .get_mut(&variant)
        .ok_or(ArcadeError::not_found("variant", variant.tag() as u64))
}

// =============================================================================
// TESTS
// =============================================================================
