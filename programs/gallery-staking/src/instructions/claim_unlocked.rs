use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{GALLERY_SEED, MAX_LOCKED_WITHDRAWALS, TREE_AUTHORITY_SEED};
use crate::errors::ErrorCode;
use crate::states::{DistributionTree, Gallery};

/// Returns custody of unlocked withdrawals to the gallery owner.
#[derive(Accounts)]
#[instruction(params: ClaimUnlockedParams)]
pub struct ClaimUnlocked<'info> {
    pub owner: Signer<'info>,

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

    /// CHECK: PDA that owns asset vaults and reward stores
    #[account(
        seeds = [TREE_AUTHORITY_SEED, tree.key().as_ref()],
        bump = tree.authority_bump
    )]
    pub tree_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct ClaimUnlockedParams {
    pub leaf_id: u32,
    pub gallery_id: u32,
    /// Queue indices, strictly descending
    pub indices: Vec<u32>,
}

impl<'info> ClaimUnlocked<'info> {
    /// Remaining accounts: one (vault token account, owner token account)
    /// pair per index, in index order.
    pub fn handle(
        ctx: Context<'_, '_, 'info, 'info, ClaimUnlocked<'info>>,
        params: ClaimUnlockedParams,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        require!(
            params.indices.len() <= MAX_LOCKED_WITHDRAWALS,
            ErrorCode::WithdrawalIndexOrder
        );
        let remaining = ctx.remaining_accounts;
        require!(
            remaining.len() == params.indices.len() * 2,
            ErrorCode::InvalidCustodyAccounts
        );

        let owner_key = ctx.accounts.owner.key();
        require_keys_eq!(
            ctx.accounts.gallery.owner,
            owner_key,
            ErrorCode::Unauthorized
        );

        msg!(
            "Claiming {} locked withdrawal(s) from gallery {} of leaf {}",
            params.indices.len(),
            params.gallery_id,
            params.leaf_id
        );

        let claimed = ctx.accounts.gallery.claim_locked(&params.indices, now)?;

        // custody accounts must line up with the claimed assets
        let authority_key = ctx.accounts.tree_authority.key();
        for (index, asset) in claimed.iter().enumerate() {
            let vault_account: Account<TokenAccount> =
                Account::try_from(&remaining[index * 2])?;
            require_keys_eq!(
                vault_account.owner,
                authority_key,
                ErrorCode::InvalidCustodyAccounts
            );
            require_keys_eq!(vault_account.mint, asset.mint, ErrorCode::InvalidCustodyAccounts);
            require!(vault_account.amount >= 1, ErrorCode::InvalidCustodyAccounts);

            let destination: Account<TokenAccount> =
                Account::try_from(&remaining[index * 2 + 1])?;
            require_keys_eq!(destination.owner, owner_key, ErrorCode::Unauthorized);
            require_keys_eq!(destination.mint, asset.mint, ErrorCode::InvalidCustodyAccounts);
        }

        // queue is fully updated; only now does custody move
        let tree_key = ctx.accounts.tree.key();
        for index in 0..claimed.len() {
            anchor_spl::token::transfer(
                CpiContext::new_with_signer(
                    ctx.accounts.token_program.to_account_info(),
                    anchor_spl::token::Transfer {
                        from: remaining[index * 2].clone(),
                        to: remaining[index * 2 + 1].clone(),
                        authority: ctx.accounts.tree_authority.to_account_info(),
                    },
                    &[&[
                        TREE_AUTHORITY_SEED,
                        tree_key.as_ref(),
                        &[ctx.accounts.tree.authority_bump],
                    ]],
                ),
                1,
            )?;
        }

        for asset in &claimed {
            msg!("Returned asset {} to {}", asset.mint, owner_key);
            emit!(crate::events::UnlockedAssetClaimed {
                tree: tree_key,
                leaf_id: params.leaf_id,
                gallery_id: params.gallery_id,
                collection: asset.collection,
                mint: asset.mint,
                owner: owner_key,
                timestamp: now,
            });
        }

        Ok(())
    }
}
