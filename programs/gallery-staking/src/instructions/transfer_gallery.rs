use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{GALLERY_SEED, STAKER_RECORD_SEED, TREE_AUTHORITY_SEED};
use crate::errors::ErrorCode;
use crate::instructions::stake::{observed_store_balance, transfer_from_store};
use crate::states::{DistributionTree, Gallery, StakerRecord};

/// Ownership-transfer hook. The external ownership ledger calls this
/// before completing a transfer: the outgoing owner is settled and paid,
/// the shares move, and the recipient starts with zero pending reward.
#[derive(Accounts)]
#[instruction(params: PrepareGalleryTransferParams)]
pub struct PrepareGalleryTransfer<'info> {
    /// The trusted ownership-ledger signer configured on the tree
    #[account(mut)]
    pub transfer_authority: Signer<'info>,

    #[account(
        mut,
        has_one = transfer_authority @ ErrorCode::Unauthorized
    )]
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

    /// CHECK: the current owner; must match the gallery
    pub from: UncheckedAccount<'info>,

    /// CHECK: the new owner
    pub to: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = transfer_authority,
        space = StakerRecord::DISCRIMINATOR.len() + StakerRecord::INIT_SPACE,
        seeds = [
            STAKER_RECORD_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            from.key().as_ref()
        ],
        bump
    )]
    pub from_record: Box<Account<'info, StakerRecord>>,

    #[account(
        init_if_needed,
        payer = transfer_authority,
        space = StakerRecord::DISCRIMINATOR.len() + StakerRecord::INIT_SPACE,
        seeds = [
            STAKER_RECORD_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            to.key().as_ref()
        ],
        bump
    )]
    pub to_record: Box<Account<'info, StakerRecord>>,

    /// CHECK: PDA that owns asset vaults and reward stores
    #[account(
        seeds = [TREE_AUTHORITY_SEED, tree.key().as_ref()],
        bump = tree.authority_bump
    )]
    pub tree_authority: UncheckedAccount<'info>,

    /// Reward store of the live version; required once a version is bound
    #[account(mut)]
    pub reward_store: Option<Box<Account<'info, TokenAccount>>>,

    /// Destination for the outgoing owner's settled reward
    #[account(mut)]
    pub from_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct PrepareGalleryTransferParams {
    pub leaf_id: u32,
    pub gallery_id: u32,
}

impl<'info> PrepareGalleryTransfer<'info> {
    pub fn handle(
        ctx: Context<PrepareGalleryTransfer>,
        params: PrepareGalleryTransferParams,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let tree_key = ctx.accounts.tree.key();
        let from_key = ctx.accounts.from.key();
        let to_key = ctx.accounts.to.key();

        require_keys_eq!(ctx.accounts.gallery.owner, from_key, ErrorCode::Unauthorized);
        require_keys_neq!(from_key, to_key, ErrorCode::Unauthorized);

        msg!(
            "Transferring gallery {} of leaf {} from {} to {}",
            params.gallery_id,
            params.leaf_id,
            from_key,
            to_key
        );

        {
            let from_record = &mut ctx.accounts.from_record;
            if from_record.owner == Pubkey::default() {
                from_record.tree = tree_key;
                from_record.leaf_id = params.leaf_id;
                from_record.owner = from_key;
                from_record.bump = ctx.bumps.from_record;
            }
        }
        {
            let to_record = &mut ctx.accounts.to_record;
            if to_record.owner == Pubkey::default() {
                to_record.tree = tree_key;
                to_record.leaf_id = params.leaf_id;
                to_record.owner = to_key;
                to_record.bump = ctx.bumps.to_record;
            }
        }

        // settle the outgoing owner at the current share counts
        let store_balance = observed_store_balance(
            &ctx.accounts.tree,
            params.leaf_id,
            ctx.accounts.reward_store.as_deref(),
        )?;
        let settled = ctx.accounts.tree.settle_staker(
            params.leaf_id,
            &mut ctx.accounts.from_record,
            store_balance,
        )?;

        // the shares follow the gallery; the leaf total is unchanged
        let moved_shares = ctx.accounts.gallery.shares;
        ctx.accounts.from_record.adjust_shares(0, moved_shares)?;
        ctx.accounts.to_record.adjust_shares(moved_shares, 0)?;

        // the recipient's snapshot starts at the settled accumulator, so
        // they inherit the shares with zero pending reward
        if let Some(outcome) = &settled {
            let snapshot = ctx.accounts.from_record.settlement_snapshot(outcome.version);
            ctx.accounts
                .to_record
                .set_settlement(outcome.version, snapshot)?;
        }

        ctx.accounts.gallery.owner = to_key;

        let settled_amount = settled.as_ref().map(|outcome| outcome.amount).unwrap_or(0);
        if let Some(outcome) = settled {
            if outcome.amount > 0 {
                let store = ctx
                    .accounts
                    .reward_store
                    .as_deref()
                    .ok_or(ErrorCode::RewardStoreRequired)?;
                let destination = ctx
                    .accounts
                    .from_reward_account
                    .as_deref()
                    .ok_or(ErrorCode::RewardStoreRequired)?;
                transfer_from_store(
                    &ctx.accounts.token_program,
                    store,
                    destination,
                    &ctx.accounts.tree_authority,
                    tree_key,
                    ctx.accounts.tree.authority_bump,
                    from_key,
                    ctx.accounts.tree.reward_mint,
                    outcome.amount,
                )?;
                msg!("Paid {} pending reward units to {}", outcome.amount, from_key);
                emit!(crate::events::RewardSettled {
                    tree: tree_key,
                    leaf_id: params.leaf_id,
                    version: outcome.version,
                    staker: from_key,
                    amount: outcome.amount,
                    timestamp: now,
                });
            }
        }

        emit!(crate::events::GalleryTransferred {
            tree: tree_key,
            leaf_id: params.leaf_id,
            gallery_id: params.gallery_id,
            from: from_key,
            to: to_key,
            shares: moved_shares,
            settled_amount,
            timestamp: now,
        });

        Ok(())
    }
}
