use anchor_lang::prelude::*;

use crate::constants::{MAX_UNSTAKE_LOCK_PERIOD, TREE_AUTHORITY_SEED, TREE_SEED};
use crate::errors::ErrorCode;
use crate::states::{DistributionTree, NodeKind};

#[derive(Accounts)]
#[instruction(params: InitializeTreeParams)]
pub struct InitializeTree<'info> {
    /// Admin who owns the new tree
    #[account(mut)]
    pub admin: Signer<'info>,

    /// The distribution tree PDA
    #[account(
        init,
        payer = admin,
        space = DistributionTree::DISCRIMINATOR.len() + DistributionTree::INIT_SPACE,
        seeds = [TREE_SEED, admin.key().as_ref(), &params.tree_seed.to_le_bytes()],
        bump
    )]
    pub tree: Box<Account<'info, DistributionTree>>,

    /// CHECK: PDA that will own asset vaults and reward stores
    #[account(
        seeds = [TREE_AUTHORITY_SEED, tree.key().as_ref()],
        bump
    )]
    pub tree_authority: UncheckedAccount<'info>,

    /// CHECK: mint of the reward token
    pub reward_mint: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitializeTreeParams {
    /// Disambiguates multiple trees of one admin
    pub tree_seed: u64,
    /// Trusted signer for gallery ownership transfers
    pub transfer_authority: Pubkey,
    /// Seconds a displaced asset stays locked
    pub unstake_lock_period: i64,
}

impl<'info> InitializeTree<'info> {
    pub fn handle(ctx: Context<InitializeTree>, params: InitializeTreeParams) -> Result<()> {
        msg!("Initializing distribution tree");

        require!(
            (0..=MAX_UNSTAKE_LOCK_PERIOD).contains(&params.unstake_lock_period),
            ErrorCode::InvalidLockPeriod
        );
        require!(
            params.transfer_authority != Pubkey::default(),
            ErrorCode::Unauthorized
        );

        let tree_key = ctx.accounts.tree.key();
        let tree = &mut ctx.accounts.tree;
        tree.admin = ctx.accounts.admin.key();
        tree.transfer_authority = params.transfer_authority;
        tree.reward_mint = ctx.accounts.reward_mint.key();
        tree.unstake_lock_period = params.unstake_lock_period;
        tree.nodes = Vec::new();
        tree.bound_stores = Vec::new();
        tree.whitelisted_collections = Vec::new();
        tree.authority_bump = ctx.bumps.tree_authority;
        tree.bump = ctx.bumps.tree;

        // node 0: the distribution root
        let root_id = tree.add_node(NodeKind::Routing)?;

        msg!("Tree initialized with root node {}", root_id);
        msg!("Reward mint: {}", tree.reward_mint);
        msg!("Unstake lock period: {} seconds", tree.unstake_lock_period);

        emit!(crate::events::TreeInitialized {
            tree: tree_key,
            admin: ctx.accounts.admin.key(),
            transfer_authority: params.transfer_authority,
            reward_mint: ctx.accounts.reward_mint.key(),
            unstake_lock_period: params.unstake_lock_period,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}
