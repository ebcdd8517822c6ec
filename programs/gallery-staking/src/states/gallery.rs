use anchor_lang::prelude::*;

use crate::constants::{MAX_LOCKED_WITHDRAWALS, MAX_SLOTS};
use crate::errors::ErrorCode;

/// An asset staked into a slot. The weight is fixed at admission time and
/// never changes while the asset is staked or locked.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct StakedAsset {
    pub collection: Pubkey,
    pub mint: Pubkey,
    pub weight: u64,
}

/// A displaced asset waiting out its timelock before custody returns to
/// the gallery owner.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct LockedWithdrawal {
    pub asset: StakedAsset,
    pub unlock_at: i64,
}

/// A staking position: a fixed array of admission-gated slots plus the
/// locked-withdrawal queue of displaced assets. `shares` is derived from
/// the slot contents and recomputed on every mutation.
#[account]
#[derive(InitSpace)]
pub struct Gallery {
    /// The distribution tree this gallery belongs to
    pub tree: Pubkey,
    /// The leaf node id
    pub leaf_id: u32,
    /// Gallery id within the leaf
    pub id: u32,
    /// Current owner
    pub owner: Pubkey,
    /// Sum of staked-asset weights across the slots
    pub shares: u64,
    #[max_len(MAX_SLOTS)]
    pub slots: Vec<Option<StakedAsset>>,
    #[max_len(MAX_LOCKED_WITHDRAWALS)]
    pub locked: Vec<LockedWithdrawal>,
    /// Bump seed for the PDA
    pub bump: u8,
}

impl Gallery {
    /// Places an asset into a slot. An occupied slot fails unless
    /// `replace` is set, in which case the previous occupant is moved to
    /// the locked-withdrawal queue. Returns the displaced asset, if any.
    pub fn stake_into_slot(
        &mut self,
        slot_id: u32,
        asset: StakedAsset,
        replace: bool,
        now: i64,
        lock_period: i64,
    ) -> Result<Option<StakedAsset>> {
        let slot = self
            .slots
            .get_mut(slot_id as usize)
            .ok_or(ErrorCode::InvalidSlot)?;
        let displaced = match slot.take() {
            Some(previous) => {
                require!(replace, ErrorCode::SlotOccupiedWithoutReplace);
                Some(previous)
            }
            None => None,
        };
        *slot = Some(asset);
        if let Some(previous) = displaced {
            self.push_locked(previous, now, lock_period)?;
        }
        self.recompute_shares();
        Ok(displaced)
    }

    /// Clears a slot that holds exactly the named asset and moves it into
    /// the locked-withdrawal queue. Returns the withdrawal's unlock time.
    pub fn unstake_from_slot(
        &mut self,
        slot_id: u32,
        collection: &Pubkey,
        mint: &Pubkey,
        now: i64,
        lock_period: i64,
    ) -> Result<(StakedAsset, i64)> {
        let slot = self
            .slots
            .get_mut(slot_id as usize)
            .ok_or(ErrorCode::InvalidSlot)?;
        let occupant = (*slot).ok_or(ErrorCode::AssetMismatch)?;
        require!(
            occupant.collection == *collection && occupant.mint == *mint,
            ErrorCode::AssetMismatch
        );
        *slot = None;
        let unlock_at = self.push_locked(occupant, now, lock_period)?;
        self.recompute_shares();
        Ok((occupant, unlock_at))
    }

    fn push_locked(&mut self, asset: StakedAsset, now: i64, lock_period: i64) -> Result<i64> {
        require!(
            self.locked.len() < MAX_LOCKED_WITHDRAWALS,
            ErrorCode::WithdrawalQueueFull
        );
        let unlock_at = now.checked_add(lock_period).ok_or(ErrorCode::MathOverflow)?;
        self.locked.push(LockedWithdrawal { asset, unlock_at });
        Ok(unlock_at)
    }

    /// Removes unlocked entries from the queue. Removal swaps each entry
    /// with the last and shrinks, which is only sound when the indices are
    /// processed from highest to lowest; anything else is rejected before
    /// a single entry moves.
    pub fn claim_locked(&mut self, indices: &[u32], now: i64) -> Result<Vec<StakedAsset>> {
        require!(!indices.is_empty(), ErrorCode::WithdrawalIndexOrder);
        let mut previous: Option<u32> = None;
        for &index in indices {
            require!(
                (index as usize) < self.locked.len(),
                ErrorCode::WithdrawalIndexOrder
            );
            if let Some(previous) = previous {
                require!(index < previous, ErrorCode::WithdrawalIndexOrder);
            }
            require!(
                self.locked[index as usize].unlock_at <= now,
                ErrorCode::WithdrawalLocked
            );
            previous = Some(index);
        }
        let mut claimed = Vec::with_capacity(indices.len());
        for &index in indices {
            let entry = self.locked.swap_remove(index as usize);
            claimed.push(entry.asset);
        }
        Ok(claimed)
    }

    /// Recomputes the derived share weight from the slot contents.
    pub fn recompute_shares(&mut self) -> u64 {
        self.shares = self
            .slots
            .iter()
            .flatten()
            .map(|asset| asset.weight)
            .sum();
        self.shares
    }
}
