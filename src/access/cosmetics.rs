//! Cosmetics Drops
//!
//! Supply-capped collections of skins. A drop is claimed either directly
//! (holding the drop's prerequisite badge) or with a permit: an ed25519
//! signature from the registered claim signer over the drop, a nonce and
//! the claimant. Each `(signer, nonce)` pair is consumed at most once.
//!
//! ```text
//!   claim-drop         exists → active → badge → supply → once per account
//!   claim-with-permit  exists → active → signer → signature → nonce
//!                      → supply → once per account
//! ```
//!
//! No escrow is involved; tokens are records owned by accounts.

use std::collections::BTreeSet;

use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::access::admin::AdminSlot;
use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::ledger::Registry;

/// Domain tag prefixed to every permit message.
pub const PERMIT_DOMAIN: &[u8] = b"ARCADE_PERMIT_V1";

/// Highest category id (0 coin, 1 table, 2 avatar).
pub const MAX_CATEGORY: u8 = 2;

/// Longest accepted drop URI, in bytes.
pub const MAX_URI_LEN: usize = 256;

/// Badge id meaning "no prerequisite".
pub const NO_BADGE: u64 = 0;

/// Ed25519 public key bytes.
pub type SignerKey = [u8; 32];

/// Ed25519 signature bytes.
pub type PermitSignature = [u8; 64];

/// One claimable collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticDrop {
    /// Identifier.
    pub id: u64,
    /// Skin category.
    pub category: u8,
    /// Skin within the category.
    pub skin: u64,
    /// Supply cap.
    pub max_supply: u64,
    /// Badge required for a direct claim (`NO_BADGE` for none).
    pub required_badge: u64,
    /// Units minted so far.
    pub minted: u64,
    /// Whether claims are accepted.
    pub active: bool,
    /// Metadata URI shared by every token of the drop.
    pub uri: String,
    /// Accounts that already claimed.
    pub claimed: BTreeSet<AccountId>,
}

/// One minted unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Identifier.
    pub id: u64,
    /// Source drop.
    pub drop_id: u64,
    /// Current owner.
    pub owner: AccountId,
    /// Category, copied from the drop.
    pub category: u8,
    /// Skin, copied from the drop.
    pub skin: u64,
}

/// Bytes a claim signer signs to authorize `claimant` on `drop_id`.
pub fn permit_message(drop_id: u64, nonce: u64, claimant: &AccountId) -> Vec<u8> {
    let mut msg = Vec::with_capacity(PERMIT_DOMAIN.len() + 16 + 16);
    msg.extend_from_slice(PERMIT_DOMAIN);
    msg.extend_from_slice(&drop_id.to_be_bytes());
    msg.extend_from_slice(&nonce.to_be_bytes());
    msg.extend_from_slice(claimant.as_bytes());
    msg
}

/// Drops, tokens, badges and the claim signer.
#[derive(Clone, Debug)]
pub struct Cosmetics {
    admin: AdminSlot,
    claim_signer: Option<SignerKey>,
    drops: Registry<CosmeticDrop>,
    tokens: Registry<Token>,
    badges: BTreeSet<(AccountId, u64)>,
    used_nonces: BTreeSet<(SignerKey, u64)>,
}

impl Cosmetics {
    /// Create with an optional bootstrap admin.
    pub fn new(admin: Option<AccountId>) -> Self {
        Self {
            admin: AdminSlot::new(admin),
            claim_signer: None,
            drops: Registry::new("drop"),
            tokens: Registry::new("token"),
            badges: BTreeSet::new(),
            used_nonces: BTreeSet::new(),
        }
    }

    /// Claim the admin slot.
    pub fn init_admin(&mut self, caller: AccountId) -> ArcadeResult<()> {
        self.admin.init("cosmetics", caller)
    }

    /// Registered permit signer.
    pub fn claim_signer(&self) -> Option<&SignerKey> {
        self.claim_signer.as_ref()
    }

    /// Open a drop. Admin only.
    pub fn create_drop(
        &mut self,
        caller: &AccountId,
        category: u64,
        skin: u64,
        max_supply: u64,
        required_badge: u64,
    ) -> ArcadeResult<u64> {
        self.admin.require(caller)?;
        if category > MAX_CATEGORY as u64 {
            return Err(ArcadeError::OutOfRange {
                field: "category",
                value: category,
                max: MAX_CATEGORY as u64,
            });
        }
        if max_supply == 0 {
            return Err(ArcadeError::InvalidAmount);
        }

        let id = self.drops.allocate(|id| CosmeticDrop {
            id,
            category: category as u8,
            skin,
            max_supply,
            required_badge,
            minted: 0,
            active: true,
            uri: String::new(),
            claimed: BTreeSet::new(),
        });
        info!(drop_id = id, category, skin, max_supply, required_badge, "Drop created");
        Ok(id)
    }

    /// Replace a drop's metadata URI. Admin only.
    pub fn set_drop_uri(&mut self, caller: &AccountId, id: u64, uri: String) -> ArcadeResult<()> {
        self.admin.require(caller)?;
        if uri.len() > MAX_URI_LEN {
            return Err(ArcadeError::OutOfRange {
                field: "uri",
                value: uri.len() as u64,
                max: MAX_URI_LEN as u64,
            });
        }
        let drop = self.drops.require_mut(id)?;
        drop.uri = uri;
        info!(drop_id = id, uri = %drop.uri, "Drop URI set");
        Ok(())
    }

    /// Pause or resume claims. Admin only.
    pub fn set_drop_active(&mut self, caller: &AccountId, id: u64, active: bool) -> ArcadeResult<()> {
        self.admin.require(caller)?;
        let drop = self.drops.require_mut(id)?;
        drop.active = active;
        info!(drop_id = id, active, "Drop activity set");
        Ok(())
    }

    /// Register the permit signer. Admin only; the key must be a valid
    /// ed25519 point.
    pub fn set_claim_signer(&mut self, caller: &AccountId, key: SignerKey) -> ArcadeResult<()> {
        self.admin.require(caller)?;
        VerifyingKey::from_bytes(&key).map_err(|_| ArcadeError::InvalidSignature)?;
        self.claim_signer = Some(key);
        info!(signer = %hex::encode(&key[..8]), "Claim signer set");
        Ok(())
    }

    /// Grant a badge. Admin only; granting twice is harmless.
    pub fn grant_badge(&mut self, caller: &AccountId, player: AccountId, badge: u64) -> ArcadeResult<()> {
        self.admin.require(caller)?;
        self.badges.insert((player, badge));
        info!(player = %player.short(), badge, "Badge granted");
        Ok(())
    }

    /// Claim one unit, gated by the drop's badge.
    pub fn claim_drop(&mut self, caller: AccountId, id: u64) -> ArcadeResult<u64> {
        let drop = self.drops.require(id)?;
        if !drop.active {
            return Err(ArcadeError::WrongState("drop is not active"));
        }
        if drop.required_badge != NO_BADGE && !self.get_badge(&caller, drop.required_badge) {
            return Err(ArcadeError::Unauthorized);
        }
        Self::check_mintable(drop, &caller)?;
        self.mint(caller, id)
    }

    /// Claim one unit with a signed permit instead of a badge.
    pub fn claim_with_permit(
        &mut self,
        caller: AccountId,
        id: u64,
        nonce: u64,
        signature: &PermitSignature,
    ) -> ArcadeResult<u64> {
        let drop = self.drops.require(id)?;
        if !drop.active {
            return Err(ArcadeError::WrongState("drop is not active"));
        }
        let signer = self
            .claim_signer
            .ok_or(ArcadeError::WrongState("no claim signer registered"))?;
        let key = VerifyingKey::from_bytes(&signer).map_err(|_| ArcadeError::InvalidSignature)?;
        let signature = Signature::from_bytes(signature);
        key.verify_strict(&permit_message(id, nonce, &caller), &signature)
            .map_err(|_| ArcadeError::InvalidSignature)?;
        if self.used_nonces.contains(&(signer, nonce)) {
            return Err(ArcadeError::NonceReused { nonce });
        }
        Self::check_mintable(drop, &caller)?;

        self.used_nonces.insert((signer, nonce));
        self.mint(caller, id)
    }

    /// Move a token. Only its owner, naming itself as `from`, may call.
    pub fn transfer(
        &mut self,
        caller: &AccountId,
        token_id: u64,
        from: AccountId,
        to: AccountId,
    ) -> ArcadeResult<()> {
        let token = self.tokens.require_mut(token_id)?;
        if *caller != from || token.owner != from {
            return Err(ArcadeError::Unauthorized);
        }
        token.owner = to;
        info!(token_id, from = %from.short(), to = %to.short(), "Token transferred");
        Ok(())
    }

    /// Look up a drop.
    pub fn get_drop(&self, id: u64) -> Option<&CosmeticDrop> {
        self.drops.get(id)
    }

    /// Look up a token.
    pub fn get_token(&self, id: u64) -> Option<&Token> {
        self.tokens.get(id)
    }

    /// Metadata URI of a token (its drop's URI).
    pub fn get_token_uri(&self, token_id: u64) -> Option<&str> {
        let token = self.tokens.get(token_id)?;
        self.drops.get(token.drop_id).map(|drop| drop.uri.as_str())
    }

    /// Whether `player` holds `badge`.
    pub fn get_badge(&self, player: &AccountId, badge: u64) -> bool {
        self.badges.contains(&(*player, badge))
    }

    fn check_mintable(drop: &CosmeticDrop, caller: &AccountId) -> ArcadeResult<()> {
        if drop.minted >= drop.max_supply {
            return Err(ArcadeError::SupplyExhausted { max_supply: drop.max_supply });
        }
        if drop.claimed.contains(caller) {
            return Err(ArcadeError::AlreadyClaimed);
        }
        Ok(())
    }

    fn mint(&mut self, owner: AccountId, drop_id: u64) -> ArcadeResult<u64> {
        let drop = self.drops.require_mut(drop_id)?;
        drop.minted += 1;
        drop.claimed.insert(owner);
        let (category, skin, minted) = (drop.category, drop.skin, drop.minted);

        let token_id = self.tokens.allocate(|id| Token { id, drop_id, owner, category, skin });
        info!(drop_id, token_id, owner = %owner.short(), minted, "Cosmetic minted");
        Ok(token_id)
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.admin.hash_into(hasher);
        match &self.claim_signer {
            Some(key) => {
                hasher.update_u8(1);
                hasher.update_bytes(key);
            }
            None => hasher.update_u8(0),
        }
        hasher.update_u64(self.drops.next_id());
        for (_, drop) in self.drops.iter() {
            hasher.update_u64(drop.id);
            hasher.update_u8(drop.category);
            hasher.update_u64(drop.skin);
            hasher.update_u64(drop.max_supply);
            hasher.update_u64(drop.required_badge);
            hasher.update_u64(drop.minted);
            hasher.update_bool(drop.active);
            hasher.update_str(&drop.uri);
            for account in &drop.claimed {
                hasher.update_account(account);
            }
        }
        hasher.update_u64(self.tokens.next_id());
        for (_, token) in self.tokens.iter() {
            hasher.update_u64(token.id);
            hasher.update_u64(token.drop_id);
            hasher.update_account(&token.owner);
        }
        hasher.update_u64(self.badges.len() as u64);
        for (player, badge) in &self.badges {
            hasher.update_account(player);
            hasher.update_u64(*badge);
        }
        hasher.update_u64(self.used_nonces.len() as u64);
        for (signer, nonce) in &self.used_nonces {
            hasher.update_bytes(signer);
            hasher.update_u64(*nonce);
        }
    }
}
