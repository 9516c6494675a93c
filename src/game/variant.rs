//! Variant Policy Table
//!
//! Every commit-reveal game runs through the same state machine. What
//! differs is captured here: the choice fields and their bounds, how many
//! parties reveal, the reveal window, the worst-case payout multiplier and
//! what expiry does with unrevealed stakes.

use serde::{Serialize, Deserialize};

use crate::config::ArcadeConfig;
use crate::error::{ArcadeError, ArcadeResult};
use crate::game::commitment::clamp_choice;
use crate::game::resolver::{
    CoinFlipResolver, CyclicResolver, GuessResolver, HigherLowerResolver, OutcomeResolver,
};

/// Commit-reveal game variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameVariant {
    /// Pick heads (0) or tails (1) against the house.
    CoinFlip,
    /// Pick 0-9 against the house.
    GuessTheNumber,
    /// Call higher (1) or lower (0) than a target 0-9 against the house.
    HigherLower,
    /// Two players, three emoji in a cycle.
    EmojiBattle,
    /// Two players, rock (0) / paper (1) / scissors (2).
    RockPaperScissors,
}

/// One committed choice byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoiceField {
    /// Argument name used in errors.
    pub name: &'static str,
    /// Largest valid value (inclusive).
    pub max: u8,
}

/// Treatment of stakes nobody revealed at expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryPolicy {
    /// Return every stake to its depositor.
    Refund,
    /// Keep player stakes in the house pool.
    ForfeitToHouse,
}

/// Parameters the generic state machine runs a variant with.
#[derive(Clone, Copy, Debug)]
pub struct VariantPolicy {
    /// The variant.
    pub variant: GameVariant,
    /// Committed fields in hashing order.
    pub fields: &'static [ChoiceField],
    /// Parties that must reveal (1 = house game, 2 = duel).
    pub revealers: u8,
    /// Ticks from creation (house) or join (duel) until expiry.
    pub reveal_window: u64,
    /// Largest multiple of the stake a house game can pay out.
    pub max_multiplier: u64,
    /// Expiry treatment when nobody revealed.
    pub expiry: ExpiryPolicy,
}

const COIN_FIELDS: &[ChoiceField] = &[ChoiceField { name: "pick", max: 1 }];
const GUESS_FIELDS: &[ChoiceField] = &[ChoiceField { name: "pick", max: 9 }];
const HIGHER_LOWER_FIELDS: &[ChoiceField] = &[
    ChoiceField { name: "choice", max: 1 },
    ChoiceField { name: "target", max: 9 },
];
const TRIPLE_FIELDS: &[ChoiceField] = &[ChoiceField { name: "choice", max: 2 }];

impl GameVariant {
    /// All variants, in table order.
    pub const ALL: [GameVariant; 5] = [
        GameVariant::CoinFlip,
        GameVariant::GuessTheNumber,
        GameVariant::HigherLower,
        GameVariant::EmojiBattle,
        GameVariant::RockPaperScissors,
    ];

    /// Stable tag for hashing.
    pub fn tag(&self) -> u8 {
        match self {
            GameVariant::CoinFlip => 0,
            GameVariant::GuessTheNumber => 1,
            GameVariant::HigherLower => 2,
            GameVariant::EmojiBattle => 3,
            GameVariant::RockPaperScissors => 4,
        }
    }

    /// Table name, also the draw domain.
    pub fn name(&self) -> &'static str {
        match self {
            GameVariant::CoinFlip => "coin-flip",
            GameVariant::GuessTheNumber => "guess-the-number",
            GameVariant::HigherLower => "higher-lower",
            GameVariant::EmojiBattle => "emoji-battle",
            GameVariant::RockPaperScissors => "rock-paper-scissors",
        }
    }

    /// Played against the house pool.
    pub fn is_house_game(&self) -> bool {
        matches!(
            self,
            GameVariant::CoinFlip | GameVariant::GuessTheNumber | GameVariant::HigherLower
        )
    }

    /// Outcome rule of this variant.
    pub fn resolver(&self) -> &'static dyn OutcomeResolver {
        match self {
            GameVariant::CoinFlip => &CoinFlipResolver,
            GameVariant::GuessTheNumber => &GuessResolver,
            GameVariant::HigherLower => &HigherLowerResolver,
            GameVariant::EmojiBattle | GameVariant::RockPaperScissors => &CyclicResolver,
        }
    }

    /// Policy row for this variant under `config`.
    pub fn policy(&self, config: &ArcadeConfig) -> VariantPolicy {
        let (fields, max_multiplier) = match self {
            GameVariant::CoinFlip => (COIN_FIELDS, 2),
            GameVariant::GuessTheNumber => (GUESS_FIELDS, 10),
            GameVariant::HigherLower => (HIGHER_LOWER_FIELDS, 10),
            GameVariant::EmojiBattle | GameVariant::RockPaperScissors => (TRIPLE_FIELDS, 1),
        };

        if self.is_house_game() {
            VariantPolicy {
                variant: *self,
                fields,
                revealers: 1,
                reveal_window: config.house_reveal_window,
                max_multiplier,
                expiry: config.house_expiry,
            }
        } else {
            VariantPolicy {
                variant: *self,
                fields,
                revealers: 2,
                reveal_window: config.duel_reveal_window,
                max_multiplier,
                expiry: ExpiryPolicy::Refund,
            }
        }
    }
}

impl VariantPolicy {
    /// Check revealed values against the field bounds and clamp them to
    /// the committed byte form. Runs before the commitment check.
    pub fn check_choices(&self, choices: &[u64]) -> ArcadeResult<Vec<u8>> {
        if choices.len() != self.fields.len() {
            return Err(ArcadeError::OutOfRange {
                field: "choice count",
                value: choices.len() as u64,
                max: self.fields.len() as u64,
            });
        }

        let mut bytes = Vec::with_capacity(choices.len());
        for (field, value) in self.fields.iter().zip(choices) {
            if *value > field.max as u64 {
                return Err(ArcadeError::OutOfRange {
                    field: field.name,
                    value: *value,
                    max: field.max as u64,
                });
            }
            bytes.push(clamp_choice(*value));
        }
        Ok(bytes)
    }

    /// House reserve backing a stake: the worst-case winnings above it.
    pub fn house_reserve(&self, stake: u64) -> ArcadeResult<u64> {
        if self.revealers != 1 {
            return Ok(0);
        }
        let pot = stake
            .checked_mul(self.max_multiplier.max(1))
            .ok_or(ArcadeError::Overflow)?;
        Ok(pot - stake)
    }
}
