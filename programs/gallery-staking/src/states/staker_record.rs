use anchor_lang::prelude::*;

use crate::constants::MAX_VERSIONS;
use crate::errors::ErrorCode;

/// Settlement snapshot of one version: the accumulator value the staker
/// was last settled against.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct Settlement {
    pub version: u16,
    pub last_settled_per_share: u128,
}

/// Per-leaf, per-user staking record: the user's aggregate share weight
/// across all their galleries in the leaf, plus one settlement snapshot
/// per version they have touched.
#[account]
#[derive(InitSpace)]
pub struct StakerRecord {
    /// The distribution tree this record belongs to
    pub tree: Pubkey,
    /// The leaf node id
    pub leaf_id: u32,
    /// The staker
    pub owner: Pubkey,
    /// Aggregate share weight across the staker's galleries in this leaf
    pub shares: u64,
    #[max_len(MAX_VERSIONS)]
    pub settlements: Vec<Settlement>,
    /// Bump seed for the PDA
    pub bump: u8,
}

impl StakerRecord {
    /// The accumulator value this staker last settled against for a
    /// version. A staker who has never settled starts from zero.
    pub fn settlement_snapshot(&self, version: u16) -> u128 {
        self.settlements
            .iter()
            .find(|settlement| settlement.version == version)
            .map(|settlement| settlement.last_settled_per_share)
            .unwrap_or(0)
    }

    /// Advances the settlement snapshot for a version. Snapshots only move
    /// forward; the accumulator they track is monotonic.
    pub fn set_settlement(&mut self, version: u16, last_settled_per_share: u128) -> Result<()> {
        if let Some(settlement) = self
            .settlements
            .iter_mut()
            .find(|settlement| settlement.version == version)
        {
            settlement.last_settled_per_share = last_settled_per_share;
            return Ok(());
        }
        require!(
            self.settlements.len() < MAX_VERSIONS,
            ErrorCode::VersionLimitReached
        );
        self.settlements.push(Settlement {
            version,
            last_settled_per_share,
        });
        Ok(())
    }

    /// Applies a share delta after the owner has been settled.
    pub fn adjust_shares(&mut self, added: u64, removed: u64) -> Result<u64> {
        self.shares = self
            .shares
            .checked_add(added)
            .ok_or(ErrorCode::MathOverflow)?
            .checked_sub(removed)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(self.shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_record() -> StakerRecord {
        StakerRecord {
            tree: Pubkey::new_unique(),
            leaf_id: 1,
            owner: Pubkey::new_unique(),
            shares: 0,
            settlements: Vec::new(),
            bump: 0,
        }
    }

    #[test]
    fn snapshot_defaults_to_zero_and_updates_in_place() {
        let mut record = empty_record();
        assert_eq!(record.settlement_snapshot(1), 0);

        record.set_settlement(1, 500).unwrap();
        record.set_settlement(2, 900).unwrap();
        assert_eq!(record.settlement_snapshot(1), 500);
        assert_eq!(record.settlement_snapshot(2), 900);

        record.set_settlement(1, 1500).unwrap();
        assert_eq!(record.settlement_snapshot(1), 1500);
        assert_eq!(record.settlements.len(), 2);
    }

    #[test]
    fn share_adjustment_is_checked() {
        let mut record = empty_record();
        record.adjust_shares(3000, 0).unwrap();
        record.adjust_shares(0, 1000).unwrap();
        assert_eq!(record.shares, 2000);
        assert!(record.adjust_shares(0, 5000).is_err());
    }
}
