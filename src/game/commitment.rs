//! Commitment Verifier
//!
//! A commitment is `sha256(secret || choice_bytes)`: the 32-byte secret is
//! opaque and each semantic choice field contributes one byte, clamped to
//! 0-255 the same way wallets build it.

use sha2::{Sha256, Digest};

/// Stored commitment digest.
pub type Commitment = [u8; 32];

/// Opaque 32-byte reveal secret.
pub type Secret = [u8; 32];

/// Clamp a choice value into one byte.
#[inline]
pub fn clamp_choice(value: u64) -> u8 {
    value.min(u8::MAX as u64) as u8
}

/// Build the commitment a player submits at create/join time.
pub fn compute_commitment(secret: &Secret, choices: &[u8]) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(choices);
    hasher.finalize().into()
}

/// Clamp raw choice values and build the commitment.
pub fn commit_to(secret: &Secret, choices: &[u64]) -> Commitment {
    let bytes: Vec<u8> = choices.iter().map(|c| clamp_choice(*c)).collect();
    compute_commitment(secret, &bytes)
}

/// Recompute and compare against the stored commitment.
///
/// Every byte is compared regardless of where the first difference is.
pub fn verify(commitment: &Commitment, secret: &Secret, choices: &[u8]) -> bool {
    let recomputed = compute_commitment(secret, choices);
    recomputed
        .iter()
        .zip(commitment.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn secret(seed: u8) -> Secret {
        [seed; 32]
    }

    #[test]
    fn test_verify_accepts_matching_reveal() {
        let commitment = compute_commitment(&secret(1), &[1, 4]);
        assert!(verify(&commitment, &secret(1), &[1, 4]));
    }

    #[test]
    fn test_verify_rejects_changes() {
        let commitment = compute_commitment(&secret(1), &[0]);
        assert!(!verify(&commitment, &secret(2), &[0]));
        assert!(!verify(&commitment, &secret(1), &[1]));
        assert!(!verify(&commitment, &secret(1), &[0, 0]));
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_choice(7), 7);
        assert_eq!(clamp_choice(255), 255);
        assert_eq!(clamp_choice(99_999), 255);
        assert_eq!(commit_to(&secret(3), &[300]), compute_commitment(&secret(3), &[255]));
    }

    #[test]
    fn test_known_digest() {
        // sha256 of 32 zero bytes followed by 0x00
        let commitment = compute_commitment(&[0; 32], &[0]);
        let mut hasher = Sha256::new();
        hasher.update([0u8; 33]);
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(commitment, expected);
    }

    #[test]
    fn test_any_flipped_byte_rejected() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..64 {
            let secret: Secret = rng.gen();
            let choices: Vec<u8> = (0..rng.gen_range(1..=2)).map(|_| rng.gen()).collect();
            let commitment = compute_commitment(&secret, &choices);
            assert!(verify(&commitment, &secret, &choices));

            let mut bad_secret = secret;
            bad_secret[rng.gen_range(0..32)] ^= 1 << rng.gen_range(0..8);
            assert!(!verify(&commitment, &bad_secret, &choices));

            let mut bad_choices = choices.clone();
            let i = rng.gen_range(0..bad_choices.len());
            bad_choices[i] = bad_choices[i].wrapping_add(rng.gen_range(1..=255));
            assert!(!verify(&commitment, &secret, &bad_choices));
        }
    }

    proptest! {
        #[test]
        fn prop_commitment_soundness(
            secret in any::<[u8; 32]>(),
            choices in proptest::collection::vec(any::<u8>(), 1..3),
            other_secret in any::<[u8; 32]>(),
            other_choices in proptest::collection::vec(any::<u8>(), 1..3),
        ) {
            let commitment = compute_commitment(&secret, &choices);
            prop_assert!(verify(&commitment, &secret, &choices));

            let same = secret == other_secret && choices == other_choices;
            prop_assert_eq!(verify(&commitment, &other_secret, &other_choices), same);
        }
    }
}
