use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;

use crate::constants::TREE_AUTHORITY_SEED;
use crate::errors::ErrorCode;
use crate::states::DistributionTree;

/// Activates the root's version and binds its reward store. The store is
/// the single funnel external reward funds are injected into; it binds to
/// exactly one version over the tree's whole lifetime.
#[derive(Accounts)]
pub struct ActivateVersion<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,

    /// CHECK: PDA that owns asset vaults and reward stores
    #[account(
        seeds = [TREE_AUTHORITY_SEED, tree.key().as_ref()],
        bump = tree.authority_bump
    )]
    pub tree_authority: UncheckedAccount<'info>,

    /// The reward store being bound to this version
    pub reward_store: Box<Account<'info, TokenAccount>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct ActivateVersionParams {
    pub version: u16,
}

impl<'info> ActivateVersion<'info> {
    pub fn handle(ctx: Context<ActivateVersion>, params: ActivateVersionParams) -> Result<()> {
        let reward_store = &ctx.accounts.reward_store;
        require_keys_eq!(
            reward_store.mint,
            ctx.accounts.tree.reward_mint,
            ErrorCode::InvalidRewardStore
        );
        require_keys_eq!(
            reward_store.owner,
            ctx.accounts.tree_authority.key(),
            ErrorCode::InvalidRewardStore
        );

        let tree = &mut ctx.accounts.tree;
        tree.activate_root_version(params.version, reward_store.key())?;

        msg!(
            "Version {} activated with reward store {}",
            params.version,
            reward_store.key()
        );

        emit!(crate::events::VersionActivated {
            tree: tree.key(),
            version: params.version,
            reward_store: reward_store.key(),
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}
