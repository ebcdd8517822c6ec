use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;

use crate::constants::GALLERY_SEED;
use crate::errors::ErrorCode;
use crate::states::{
    pending_amount, DistributionTree, Gallery, LockedWithdrawal, StakedAsset, StakerRecord,
};

/// Read-only pending-reward query. Simulates the full pull chain without
/// committing anything; the numbers are the same ones a claim would pay.
#[derive(Accounts)]
pub struct GetCurrentRewardAmount<'info> {
    /// CHECK: the staker being queried
    pub staker: UncheckedAccount<'info>,

    pub tree: Box<Account<'info, DistributionTree>>,

    /// The staker's record; absent for a user who never staked here
    pub staker_record: Option<Box<Account<'info, StakerRecord>>>,

    /// The reward store bound to the queried version
    pub reward_store: Option<Box<Account<'info, TokenAccount>>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct GetCurrentRewardAmountParams {
    pub leaf_id: u32,
    pub version: u16,
}

impl<'info> GetCurrentRewardAmount<'info> {
    pub fn handle(
        ctx: Context<GetCurrentRewardAmount>,
        params: GetCurrentRewardAmountParams,
    ) -> Result<u64> {
        let tree = &ctx.accounts.tree;

        let (shares, snapshot) = match ctx.accounts.staker_record.as_deref() {
            Some(record) => {
                require_keys_eq!(record.tree, tree.key(), ErrorCode::Unauthorized);
                require_keys_eq!(
                    record.owner,
                    ctx.accounts.staker.key(),
                    ErrorCode::Unauthorized
                );
                require!(record.leaf_id == params.leaf_id, ErrorCode::Unauthorized);
                (record.shares, record.settlement_snapshot(params.version))
            }
            None => (0, 0),
        };

        let Some(bound_store) = tree.root_store(params.version)? else {
            msg!("Version {} has no bound reward store", params.version);
            return Ok(0);
        };
        let store = ctx
            .accounts
            .reward_store
            .as_deref()
            .ok_or(ErrorCode::RewardStoreRequired)?;
        require_keys_eq!(store.key(), bound_store, ErrorCode::InvalidRewardStore);

        let plan = tree.compute_pull(params.leaf_id, params.version, store.amount)?;
        let amount = pending_amount(shares, plan.leaf_cumulative_per_share, snapshot)?;

        msg!(
            "Pending reward for {} on leaf {} version {}: {}",
            ctx.accounts.staker.key(),
            params.leaf_id,
            params.version,
            amount
        );

        Ok(amount)
    }
}

/// Position view returned by `query_gallery`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct GalleryView {
    pub leaf_id: u32,
    pub gallery_id: u32,
    pub owner: Pubkey,
    pub shares: u64,
    pub slots: Vec<Option<StakedAsset>>,
    pub locked: Vec<LockedWithdrawal>,
}

#[derive(Accounts)]
#[instruction(params: QueryGalleryParams)]
pub struct QueryGallery<'info> {
    pub tree: Box<Account<'info, DistributionTree>>,

    #[account(
        seeds = [
            GALLERY_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            &params.gallery_id.to_le_bytes()
        ],
        bump = gallery.bump
    )]
    pub gallery: Box<Account<'info, Gallery>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct QueryGalleryParams {
    pub leaf_id: u32,
    pub gallery_id: u32,
}

impl<'info> QueryGallery<'info> {
    pub fn handle(ctx: Context<QueryGallery>, params: QueryGalleryParams) -> Result<GalleryView> {
        let gallery = &ctx.accounts.gallery;

        let view = GalleryView {
            leaf_id: params.leaf_id,
            gallery_id: params.gallery_id,
            owner: gallery.owner,
            shares: gallery.shares,
            slots: gallery.slots.clone(),
            locked: gallery.locked.clone(),
        };

        msg!("Gallery {} of leaf {}", params.gallery_id, params.leaf_id);
        msg!("Owner: {}", view.owner);
        msg!("Shares: {}", view.shares);
        msg!("Locked withdrawals: {}", view.locked.len());

        Ok(view)
    }
}
