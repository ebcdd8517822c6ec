use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{STAKER_RECORD_SEED, TREE_AUTHORITY_SEED};
use crate::errors::ErrorCode;
use crate::instructions::stake::transfer_from_store;
use crate::states::{pending_amount, DistributionTree, StakerRecord};

/// Claims a staker's pending reward for a version. Permissionless: anyone
/// may crank a claim, the payout only ever reaches the staker's own
/// token account.
#[derive(Accounts)]
#[instruction(params: ClaimRewardParams)]
pub struct ClaimReward<'info> {
    /// CHECK: the staker being claimed for; validated against the record PDA
    pub staker: UncheckedAccount<'info>,

    #[account(mut)]
    pub tree: Box<Account<'info, DistributionTree>>,

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

    /// The reward store bound to the claimed version
    #[account(mut)]
    pub reward_store: Box<Account<'info, TokenAccount>>,

    /// The staker's reward token account
    #[account(mut)]
    pub staker_reward_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct ClaimRewardParams {
    pub leaf_id: u32,
    pub version: u16,
}

impl<'info> ClaimReward<'info> {
    pub fn handle(ctx: Context<ClaimReward>, params: ClaimRewardParams) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let tree_key = ctx.accounts.tree.key();
        let staker_key = ctx.accounts.staker.key();

        let bound_store = ctx
            .accounts
            .tree
            .root_store(params.version)?
            .ok_or(ErrorCode::VersionNotActive)?;
        require_keys_eq!(
            ctx.accounts.reward_store.key(),
            bound_store,
            ErrorCode::InvalidRewardStore
        );

        // the real pull chain: identical numbers to the simulation, but
        // committed before anything is paid
        let store_balance = ctx.accounts.reward_store.amount;
        let tree = &mut ctx.accounts.tree;
        let plan = tree.compute_pull(params.leaf_id, params.version, store_balance)?;
        tree.apply_pull(&plan)?;

        let record = &mut ctx.accounts.staker_record;
        let snapshot = record.settlement_snapshot(params.version);
        let amount = pending_amount(record.shares, plan.leaf_cumulative_per_share, snapshot)?;
        record.set_settlement(params.version, plan.leaf_cumulative_per_share)?;

        if amount > 0 {
            tree.note_payout(params.version, amount)?;
            transfer_from_store(
                &ctx.accounts.token_program,
                &ctx.accounts.reward_store,
                &ctx.accounts.staker_reward_account,
                &ctx.accounts.tree_authority,
                tree_key,
                ctx.accounts.tree.authority_bump,
                staker_key,
                ctx.accounts.tree.reward_mint,
                amount,
            )?;
            msg!("Claimed {} reward units for {}", amount, staker_key);
        } else {
            // zero pending is a no-op transfer-wise, but the snapshot is
            // settled so later share changes start from a clean baseline
            msg!("Nothing pending for {}; snapshot settled", staker_key);
        }

        emit!(crate::events::RewardClaimed {
            tree: tree_key,
            leaf_id: params.leaf_id,
            version: params.version,
            staker: staker_key,
            amount,
            shares: ctx.accounts.staker_record.shares,
            timestamp: now,
        });

        Ok(())
    }
}
