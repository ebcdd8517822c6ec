use anchor_lang::prelude::*;

use crate::constants::MAX_ASSET_TRAITS;

/// One trait carried by an asset.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct TraitValue {
    pub trait_id: u16,
    pub value: u32,
}

/// Admission record of one asset: its collection, its rarity weight and
/// the trait vector the slot requirements are checked against. Registered
/// by the admin before the asset can be staked; immutable afterwards.
#[account]
#[derive(InitSpace)]
pub struct AssetRecord {
    /// The asset's collection
    pub collection: Pubkey,
    /// The asset mint
    pub mint: Pubkey,
    /// Share weight the asset contributes while staked
    pub weight: u64,
    #[max_len(MAX_ASSET_TRAITS)]
    pub traits: Vec<TraitValue>,
    /// Bump seed for the PDA
    pub bump: u8,
}
