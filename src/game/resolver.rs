//! Outcome Resolvers
//!
//! Pure functions from revealed choice bytes (and, for house games, the
//! draw taken at reveal time) to a verdict. Every input combination maps to
//! exactly one verdict; missing bytes read as zero.

use serde::{Serialize, Deserialize};

use crate::config::BPS_DENOMINATOR;

/// Finalized inputs of one game.
#[derive(Clone, Copy, Debug)]
pub struct Reveals<'a> {
    /// Creator's revealed bytes.
    pub creator: &'a [u8],
    /// Opponent's revealed bytes (empty for house games).
    pub opponent: &'a [u8],
    /// House draw (zero for duels).
    pub draw: u8,
}

/// Result of resolving a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// House game: the player receives `stake * payout_bps / 10_000`,
    /// rounded down (zero on a loss).
    House {
        /// Value drawn at reveal.
        draw: u8,
        /// Payout in basis points of the stake.
        payout_bps: u64,
    },
    /// Creator takes both stakes.
    CreatorWins,
    /// Opponent takes both stakes.
    OpponentWins,
    /// Both stakes return.
    Push,
}

impl Verdict {
    /// True when the player beat the house.
    pub fn player_won(&self) -> bool {
        matches!(self, Verdict::House { payout_bps, .. } if *payout_bps > 0)
    }
}

/// Outcome rule of one variant.
pub trait OutcomeResolver: Send + Sync {
    /// Exclusive bound of the house draw. `None` for two-player games.
    fn draw_bound(&self) -> Option<u64>;

    /// Map finalized inputs to a verdict.
    fn resolve(&self, reveals: &Reveals<'_>) -> Verdict;
}

#[inline]
fn byte(bytes: &[u8], index: usize) -> u8 {
    bytes.get(index).copied().unwrap_or(0)
}

/// Coin flip: matching the draw doubles the stake.
pub struct CoinFlipResolver;

impl OutcomeResolver for CoinFlipResolver {
    fn draw_bound(&self) -> Option<u64> {
        Some(2)
    }

    fn resolve(&self, reveals: &Reveals<'_>) -> Verdict {
        let payout_bps = if byte(reveals.creator, 0) == reveals.draw { 2 * BPS_DENOMINATOR } else { 0 };
        Verdict::House { draw: reveals.draw, payout_bps }
    }
}

/// Guess the number: an exact hit pays ten times the stake.
pub struct GuessResolver;

impl OutcomeResolver for GuessResolver {
    fn draw_bound(&self) -> Option<u64> {
        Some(10)
    }

    fn resolve(&self, reveals: &Reveals<'_>) -> Verdict {
        let payout_bps = if byte(reveals.creator, 0) == reveals.draw { 10 * BPS_DENOMINATOR } else { 0 };
        Verdict::House { draw: reveals.draw, payout_bps }
    }
}

/// Higher or lower than a player-chosen target.
///
/// A win pays `10 / winning_draws` times the stake, kept in basis points so
/// odds like 3 in 10 pay 3.3333x instead of 3x. A draw equal to the target
/// always loses.
pub struct HigherLowerResolver;

impl HigherLowerResolver {
    /// Draws in 0..10 that win for this call.
    pub fn winning_draws(higher: bool, target: u8) -> u64 {
        let target = target.min(9) as u64;
        if higher {
            9 - target
        } else {
            target
        }
    }
}

impl OutcomeResolver for HigherLowerResolver {
    fn draw_bound(&self) -> Option<u64> {
        Some(10)
    }

    fn resolve(&self, reveals: &Reveals<'_>) -> Verdict {
        let higher = byte(reveals.creator, 0) == 1;
        let target = byte(reveals.creator, 1);
        let draw = reveals.draw;

        let won = if higher { draw > target } else { draw < target };
        let winning = Self::winning_draws(higher, target);
        let payout_bps = if won && winning > 0 { 10 * BPS_DENOMINATOR / winning } else { 0 };

        Verdict::House { draw, payout_bps }
    }
}

/// Three symbols in a cycle: `a` beats `b` when `(a - b) mod 3 == 1`.
///
/// Rock (0) < paper (1) < scissors (2) < rock.
pub struct CyclicResolver;

impl CyclicResolver {
    /// Compare two symbols.
    pub fn duel(a: u8, b: u8) -> Verdict {
        let a = a % 3;
        let b = b % 3;
        match (a + 3 - b) % 3 {
            0 => Verdict::Push,
            1 => Verdict::CreatorWins,
            _ => Verdict::OpponentWins,
        }
    }
}

impl OutcomeResolver for CyclicResolver {
    fn draw_bound(&self) -> Option<u64> {
        None
    }

    fn resolve(&self, reveals: &Reveals<'_>) -> Verdict {
        Self::duel(byte(reveals.creator, 0), byte(reveals.opponent, 0))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn house(creator: &[u8], draw: u8) -> Reveals<'_> {
        Reveals { creator, opponent: &[], draw }
    }

    #[test]
    fn test_coin_flip() {
        assert_eq!(
            CoinFlipResolver.resolve(&house(&[1], 1)),
            Verdict::House { draw: 1, payout_bps: 20_000 }
        );
        assert!(!CoinFlipResolver.resolve(&house(&[0], 1)).player_won());
    }

    #[test]
    fn test_guess() {
        assert!(GuessResolver.resolve(&house(&[7], 7)).player_won());
        assert_eq!(
            GuessResolver.resolve(&house(&[7], 6)),
            Verdict::House { draw: 6, payout_bps: 0 }
        );
    }

    #[test]
    fn test_higher_lower_multipliers() {
        // higher than 4: draws 5..=9 win, 10 / 5 = 2
        assert_eq!(
            HigherLowerResolver.resolve(&house(&[1, 4], 8)),
            Verdict::House { draw: 8, payout_bps: 20_000 }
        );
        // lower than 1: only 0 wins
        assert_eq!(
            HigherLowerResolver.resolve(&house(&[0, 1], 0)),
            Verdict::House { draw: 0, payout_bps: 100_000 }
        );
        // equal loses
        assert!(!HigherLowerResolver.resolve(&house(&[1, 4], 4)).player_won());
        // lower than 0 can never win
        for draw in 0..10 {
            assert!(!HigherLowerResolver.resolve(&house(&[0, 0], draw)).player_won());
        }
    }

    #[test]
    fn test_higher_lower_pays_fractional_odds() {
        // higher than 6: 7, 8, 9 win
        assert_eq!(
            HigherLowerResolver.resolve(&house(&[1, 6], 9)),
            Verdict::House { draw: 9, payout_bps: 33_333 }
        );
        // higher than 2: seven winning draws, 1.4285x rather than break-even
        assert_eq!(
            HigherLowerResolver.resolve(&house(&[1, 2], 3)),
            Verdict::House { draw: 3, payout_bps: 14_285 }
        );
        // lower than 9: nine winning draws still pays more than the stake
        match HigherLowerResolver.resolve(&house(&[0, 9], 0)) {
            Verdict::House { payout_bps, .. } => assert!(payout_bps > BPS_DENOMINATOR),
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_higher_lower_never_exceeds_max() {
        for higher in [0u8, 1] {
            for target in 0..10u8 {
                for draw in 0..10u8 {
                    match HigherLowerResolver.resolve(&house(&[higher, target], draw)) {
                        Verdict::House { payout_bps, .. } => {
                            assert!(payout_bps <= 10 * BPS_DENOMINATOR)
                        }
                        other => panic!("unexpected verdict {:?}", other),
                    }
                }
            }
        }
    }

    #[test]
    fn test_cyclic_dominance() {
        // paper beats rock, scissors beats paper, rock beats scissors
        assert_eq!(CyclicResolver::duel(1, 0), Verdict::CreatorWins);
        assert_eq!(CyclicResolver::duel(2, 1), Verdict::CreatorWins);
        assert_eq!(CyclicResolver::duel(0, 2), Verdict::CreatorWins);
        assert_eq!(CyclicResolver::duel(0, 1), Verdict::OpponentWins);
        for s in 0..3 {
            assert_eq!(CyclicResolver::duel(s, s), Verdict::Push);
        }
    }

    #[test]
    fn test_cyclic_is_total_and_antisymmetric() {
        for a in 0..3u8 {
            for b in 0..3u8 {
                let forward = CyclicResolver::duel(a, b);
                let backward = CyclicResolver::duel(b, a);
                match forward {
                    Verdict::Push => assert_eq!(backward, Verdict::Push),
                    Verdict::CreatorWins => assert_eq!(backward, Verdict::OpponentWins),
                    Verdict::OpponentWins => assert_eq!(backward, Verdict::CreatorWins),
                    Verdict::House { .. } => panic!("duel produced house verdict"),
                }
            }
        }
    }
}
