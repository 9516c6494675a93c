//! Arcade Ledger Replay Binary
//!
//! Executes a JSON operation log against a fresh engine, logs every
//! receipt and prints the final state hash. The recorded transcript is
//! replayed once more to confirm the run is deterministic.
//!
//! A log is a JSON array whose items are either a signed operation
//! `{"caller": ..., "op": {...}}` or a host-sealed block `{"seal": "<hex>"}`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use arcade_ledger::{
    AccountId, Arcade, ArcadeConfig, GameVariant, LedgerEntropy, Operation, Receipt, SignedOp,
    VERSION, commit_to, verify_transcript,
    core::{StateHash, StateHasher},
    engine::AdminTable,
};

/// Replay an arcade operation log.
#[derive(Debug, Parser)]
#[command(name = "arcade-ledger", version, about)]
struct Args {
    /// Engine configuration (JSON). Defaults plus `ARCADE_*` overrides when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Operation log: a JSON array of `{"caller": ..., "op": {...}}` and
    /// `{"seal": "<hex beacon>"}` items. Runs a built-in demo session when
    /// omitted.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Write the bincode transcript here.
    #[arg(long)]
    transcript_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let args = Args::parse();
    info!("Arcade Ledger v{}", VERSION);

    let config = match &args.config {
        Some(path) => ArcadeConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ArcadeConfig::from_env().context("reading ARCADE_* overrides")?,
    };

    let mut arcade = Arcade::new(config, Box::new(LedgerEntropy)).context("starting engine")?;

    let (accepted, rejected) = match &args.log {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading log {}", path.display()))?;
            let entries: Vec<LogEntry> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing log {}", path.display()))?;
            info!(entries = entries.len(), "Replaying operation log");
            run(&mut arcade, entries)
        }
        None => demo(&mut arcade)?,
    };

    let final_hash = hex::encode(arcade.state_hash());
    info!(accepted, rejected, height = arcade.height(), "Session finished");
    println!("{}", final_hash);

    // Verify determinism by replaying
    let transcript = arcade.into_transcript();
    let verification = verify_transcript(&transcript, Box::new(LedgerEntropy));
    if !verification.valid {
        bail!(
            "replay diverged: {}",
            verification
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "final hash differs".to_string())
        );
    }
    info!(operations = transcript.len(), "Replay verified");

    if let Some(path) = &args.transcript_out {
        let bytes = transcript.to_bytes()?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("writing transcript {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "Transcript written");
    }

    Ok(())
}

/// One item of an operation log.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LogEntry {
    /// Host seals the next block with this beacon.
    Seal {
        #[serde(with = "arcade_ledger::core::hex_bytes::array")]
        seal: StateHash,
    },
    /// Caller submits an operation.
    Op(SignedOp),
}

fn run(arcade: &mut Arcade, entries: Vec<LogEntry>) -> (usize, usize) {
    let mut accepted = 0;
    let mut rejected = 0;
    for entry in entries {
        let SignedOp { caller, op } = match entry {
            LogEntry::Seal { seal } => {
                let height = arcade.seal_block(seal);
                info!(height, beacon = %hex::encode(seal), "sealed");
                continue;
            }
            LogEntry::Op(signed) => signed,
        };
        let receipt = arcade.submit(caller, op);
        log_receipt(&receipt);
        if receipt.is_ok() {
            accepted += 1;
        } else {
            rejected += 1;
        }
    }
    (accepted, rejected)
}

fn log_receipt(receipt: &Receipt) {
    if receipt.is_ok() {
        info!(
            seq = receipt.seq,
            height = receipt.height,
            caller = %receipt.caller.short(),
            action = %receipt.action,
            output = ?receipt.output,
            "ok"
        );
    } else {
        warn!(
            seq = receipt.seq,
            height = receipt.height,
            caller = %receipt.caller.short(),
            action = %receipt.action,
            code = receipt.code,
            error = receipt.error.as_deref().unwrap_or(""),
            "rejected"
        );
    }
}

/// Stand-in for the settlement chain's block hash.
fn beacon() -> StateHash {
    let mut hasher = StateHasher::new(b"ARCADE_DEMO_BEACON");
    hasher.update_bytes(Uuid::new_v4().as_bytes());
    hasher.finalize()
}

/// Demo session touching every table.
fn demo(arcade: &mut Arcade) -> Result<(usize, usize)> {
    info!("=== Starting Demo Session ===");

    let deployer = AccountId::from_label("deployer");
    let alice = AccountId::from_label("wallet_1");
    let bob = AccountId::from_label("wallet_2");
    let carol = AccountId::from_label("wallet_3");

    arcade.credit(deployer, 100_000_000)?;
    for wallet in [alice, bob, carol] {
        arcade.credit(wallet, 10_000_000)?;
    }

    let rps = GameVariant::RockPaperScissors;
    let coin = GameVariant::CoinFlip;
    let signed = |caller: AccountId, op: Operation| LogEntry::Op(SignedOp { caller, op });
    let mut log = Vec::new();

    for table in [
        AdminTable::Scoreboard,
        AdminTable::Lottery,
        AdminTable::Tournament,
        AdminTable::Cosmetics,
    ] {
        log.push(signed(deployer, Operation::InitAdmin { table }));
    }
    log.push(signed(deployer, Operation::FundHouse { amount: 50_000_000 }));

    // Rock beats scissors.
    log.push(signed(alice, Operation::CreateGame { variant: rps, stake: 1_000_000, commitment: commit_to(&[1; 32], &[0]) }));
    log.push(signed(bob, Operation::JoinGame { variant: rps, id: 0, commitment: commit_to(&[2; 32], &[2]) }));
    log.push(signed(alice, Operation::Reveal { variant: rps, id: 0, choices: vec![0], secret: [1; 32] }));
    log.push(signed(bob, Operation::Reveal { variant: rps, id: 0, choices: vec![2], secret: [2; 32] }));

    log.push(signed(carol, Operation::CreateGame { variant: coin, stake: 500_000, commitment: commit_to(&[3; 32], &[1]) }));

    log.push(signed(deployer, Operation::CreateRound { ticket_price: 100_000, duration: 10 }));
    log.push(signed(alice, Operation::BuyTicket { round_id: 0 }));
    log.push(signed(bob, Operation::BuyTicket { round_id: 0 }));
    log.push(signed(carol, Operation::BuyTicket { round_id: 0 }));

    log.push(signed(deployer, Operation::CreatePotato { stake: 200_000 }));
    log.push(signed(alice, Operation::TakePotato { id: 0 }));

    log.push(signed(deployer, Operation::SetScore { player: alice, value: 3 }));
    log.push(signed(bob, Operation::SetScore { player: bob, value: 99 }));
    log.push(signed(alice, Operation::CreateTask));
    log.push(signed(alice, Operation::SetCompleted { id: 0, completed: true }));

    // The coin flip resolves against the first sealed block after it.
    log.push(LogEntry::Seal { seal: beacon() });
    log.push(signed(carol, Operation::Reveal { variant: coin, id: 0, choices: vec![1], secret: [3; 32] }));

    log.push(signed(carol, Operation::Advance { blocks: 40 }));
    log.push(LogEntry::Seal { seal: beacon() });
    log.push(signed(bob, Operation::Draw { round_id: 0 }));
    log.push(signed(bob, Operation::SettlePotato { id: 0 }));

    Ok(run(arcade, log))
}
