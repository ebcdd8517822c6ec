use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{GALLERY_SEED, MAX_SLOTS, STAKER_RECORD_SEED, TREE_AUTHORITY_SEED};
use crate::errors::ErrorCode;
use crate::instructions::stake::{observed_store_balance, transfer_from_store};
use crate::states::{DistributionTree, Gallery, StakerRecord};

/// Unstaking clears slots and moves the assets into the gallery's
/// locked-withdrawal queue; custody stays with the program until the
/// timelock elapses and the owner claims.
#[derive(Accounts)]
#[instruction(params: UnstakeParams)]
pub struct Unstake<'info> {
    #[account(mut)]
    pub staker: Signer<'info>,

    #[account(mut)]
    pub tree: Box<Account<'info, DistributionTree>>,

    #[account(
        mut,
        seeds = [
            GALLERY_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            &params.gallery_id.to_le_bytes()
        ],
        bump = gallery.bump
    )]
    pub gallery: Box<Account<'info, Gallery>>,

    #[account(
        mut,
        seeds = [
            STAKER_RECORD_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            staker.key().as_ref()
        ],
        bump = staker_record.bump
    )]
    pub staker_record: Box<Account<'info, StakerRecord>>,

    /// CHECK: PDA that owns asset vaults and reward stores
    #[account(
        seeds = [TREE_AUTHORITY_SEED, tree.key().as_ref()],
        bump = tree.authority_bump
    )]
    pub tree_authority: UncheckedAccount<'info>,

    /// Reward store of the live version; required once a version is bound
    #[account(mut)]
    pub reward_store: Option<Box<Account<'info, TokenAccount>>>,

    /// Destination for the staker's settled reward
    #[account(mut)]
    pub staker_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct UnstakeEntry {
    pub slot_id: u32,
    pub collection: Pubkey,
    pub mint: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct UnstakeParams {
    pub leaf_id: u32,
    pub gallery_id: u32,
    pub entries: Vec<UnstakeEntry>,
}

impl<'info> Unstake<'info> {
    pub fn handle(ctx: Context<Unstake>, params: UnstakeParams) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        require!(!params.entries.is_empty(), ErrorCode::EmptyStakeBatch);
        require!(params.entries.len() <= MAX_SLOTS, ErrorCode::InvalidSlot);

        let tree_key = ctx.accounts.tree.key();
        let staker_key = ctx.accounts.staker.key();
        msg!(
            "Unstaking {} asset(s) from gallery {} of leaf {}",
            params.entries.len(),
            params.gallery_id,
            params.leaf_id
        );

        require_keys_eq!(
            ctx.accounts.gallery.owner,
            staker_key,
            ErrorCode::Unauthorized
        );

        let mut removed: u64 = 0;
        let mut unstaked = Vec::with_capacity(params.entries.len());
        for entry in &params.entries {
            let (asset, unlock_at) = ctx.accounts.gallery.unstake_from_slot(
                entry.slot_id,
                &entry.collection,
                &entry.mint,
                now,
                ctx.accounts.tree.unstake_lock_period,
            )?;
            removed = removed
                .checked_add(asset.weight)
                .ok_or(ErrorCode::MathOverflow)?;
            unstaked.push((entry.slot_id, asset, unlock_at));
        }

        // settle at the pre-change share counts, then debit the totals
        let store_balance = observed_store_balance(
            &ctx.accounts.tree,
            params.leaf_id,
            ctx.accounts.reward_store.as_deref(),
        )?;
        let settled = ctx.accounts.tree.settle_staker(
            params.leaf_id,
            &mut ctx.accounts.staker_record,
            store_balance,
        )?;
        ctx.accounts.staker_record.adjust_shares(0, removed)?;
        ctx.accounts
            .tree
            .adjust_leaf_shares(params.leaf_id, 0, removed)?;

        msg!(
            "Gallery shares now {}, staker shares now {}",
            ctx.accounts.gallery.shares,
            ctx.accounts.staker_record.shares
        );

        if let Some(outcome) = settled {
            if outcome.amount > 0 {
                let store = ctx
                    .accounts
                    .reward_store
                    .as_deref()
                    .ok_or(ErrorCode::RewardStoreRequired)?;
                let destination = ctx
                    .accounts
                    .staker_reward_account
                    .as_deref()
                    .ok_or(ErrorCode::RewardStoreRequired)?;
                transfer_from_store(
                    &ctx.accounts.token_program,
                    store,
                    destination,
                    &ctx.accounts.tree_authority,
                    tree_key,
                    ctx.accounts.tree.authority_bump,
                    staker_key,
                    ctx.accounts.tree.reward_mint,
                    outcome.amount,
                )?;
                msg!("Settled {} pending reward units", outcome.amount);
                emit!(crate::events::RewardSettled {
                    tree: tree_key,
                    leaf_id: params.leaf_id,
                    version: outcome.version,
                    staker: staker_key,
                    amount: outcome.amount,
                    timestamp: now,
                });
            }
        }

        for (slot_id, asset, unlock_at) in unstaked {
            emit!(crate::events::AssetUnstaked {
                tree: tree_key,
                leaf_id: params.leaf_id,
                gallery_id: params.gallery_id,
                slot_id,
                collection: asset.collection,
                mint: asset.mint,
                unlock_at,
                timestamp: now,
            });
        }

        Ok(())
    }
}
