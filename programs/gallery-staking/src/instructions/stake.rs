use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{
    ASSET_RECORD_SEED, GALLERY_SEED, LEAF_CONFIG_SEED, MAX_SLOTS, STAKER_RECORD_SEED,
    TREE_AUTHORITY_SEED,
};
use crate::errors::ErrorCode;
use crate::states::{
    AssetRecord, DistributionTree, Gallery, LeafConfig, StakedAsset, StakerRecord,
};

#[derive(Accounts)]
#[instruction(params: StakeParams)]
pub struct Stake<'info> {
    #[account(mut)]
    pub staker: Signer<'info>,

    #[account(mut)]
    pub tree: Box<Account<'info, DistributionTree>>,

    #[account(
        seeds = [LEAF_CONFIG_SEED, tree.key().as_ref(), &params.leaf_id.to_le_bytes()],
        bump = leaf_config.bump
    )]
    pub leaf_config: Box<Account<'info, LeafConfig>>,

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
        init_if_needed,
        payer = staker,
        space = StakerRecord::DISCRIMINATOR.len() + StakerRecord::INIT_SPACE,
        seeds = [
            STAKER_RECORD_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            staker.key().as_ref()
        ],
        bump
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
    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct StakeEntry {
    pub slot_id: u32,
    pub collection: Pubkey,
    pub mint: Pubkey,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct StakeParams {
    pub leaf_id: u32,
    pub gallery_id: u32,
    pub entries: Vec<StakeEntry>,
    pub replace: bool,
}

impl<'info> Stake<'info> {
    /// Remaining accounts: one (asset record, staker token account, vault
    /// token account) triple per entry, in entry order.
    pub fn handle(
        ctx: Context<'_, '_, 'info, 'info, Stake<'info>>,
        params: StakeParams,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        require!(!params.entries.is_empty(), ErrorCode::EmptyStakeBatch);
        require!(params.entries.len() <= MAX_SLOTS, ErrorCode::InvalidSlot);
        let remaining = ctx.remaining_accounts;
        require!(
            remaining.len() == params.entries.len() * 3,
            ErrorCode::InvalidCustodyAccounts
        );

        let tree_key = ctx.accounts.tree.key();
        let staker_key = ctx.accounts.staker.key();
        msg!(
            "Staking {} asset(s) into gallery {} of leaf {}",
            params.entries.len(),
            params.gallery_id,
            params.leaf_id
        );

        require_keys_eq!(
            ctx.accounts.gallery.owner,
            staker_key,
            ErrorCode::Unauthorized
        );
        initialize_staker_record(&mut ctx.accounts.staker_record, tree_key, &params, &staker_key, ctx.bumps.staker_record);

        // validate every entry and mutate the slot ledger
        let mut added: u64 = 0;
        let mut removed: u64 = 0;
        let mut staked = Vec::with_capacity(params.entries.len());
        for (index, entry) in params.entries.iter().enumerate() {
            let asset_record = load_asset_record(&remaining[index * 3], entry)?;
            require!(
                ctx.accounts.tree.is_whitelisted(&entry.collection),
                ErrorCode::AssetNotWhitelisted
            );
            ctx.accounts
                .leaf_config
                .check_admission(entry.slot_id, &asset_record.traits)?;
            check_custody_pair(
                &remaining[index * 3 + 1],
                &remaining[index * 3 + 2],
                entry,
                &staker_key,
                &ctx.accounts.tree_authority.key(),
            )?;

            let asset = StakedAsset {
                collection: entry.collection,
                mint: entry.mint,
                weight: asset_record.weight,
            };
            let displaced = ctx.accounts.gallery.stake_into_slot(
                entry.slot_id,
                asset,
                params.replace,
                now,
                ctx.accounts.tree.unstake_lock_period,
            )?;
            added = added.checked_add(asset.weight).ok_or(ErrorCode::MathOverflow)?;
            if let Some(previous) = displaced {
                removed = removed
                    .checked_add(previous.weight)
                    .ok_or(ErrorCode::MathOverflow)?;
            }
            staked.push((entry.slot_id, asset, displaced.is_some()));
        }

        // settle pending reward at the pre-change share counts, then apply
        // the net share delta to the record and the leaf total
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
        ctx.accounts.staker_record.adjust_shares(added, removed)?;
        ctx.accounts
            .tree
            .adjust_leaf_shares(params.leaf_id, added, removed)?;

        msg!(
            "Gallery shares now {}, staker shares now {}",
            ctx.accounts.gallery.shares,
            ctx.accounts.staker_record.shares
        );

        // custody moves only after every ledger mutation is finalized
        for index in 0..params.entries.len() {
            anchor_spl::token::transfer(
                CpiContext::new(
                    ctx.accounts.token_program.to_account_info(),
                    anchor_spl::token::Transfer {
                        from: remaining[index * 3 + 1].clone(),
                        to: remaining[index * 3 + 2].clone(),
                        authority: ctx.accounts.staker.to_account_info(),
                    },
                ),
                1,
            )?;
        }

        if let Some(outcome) = settled {
            if outcome.amount > 0 {
                pay_settlement(&ctx, outcome.amount)?;
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

        for (slot_id, asset, replaced) in staked {
            emit!(crate::events::AssetStaked {
                tree: tree_key,
                leaf_id: params.leaf_id,
                gallery_id: params.gallery_id,
                slot_id,
                collection: asset.collection,
                mint: asset.mint,
                weight: asset.weight,
                replaced,
                timestamp: now,
            });
        }

        Ok(())
    }
}

fn initialize_staker_record(
    record: &mut StakerRecord,
    tree_key: Pubkey,
    params: &StakeParams,
    staker_key: &Pubkey,
    bump: u8,
) {
    if record.owner == Pubkey::default() {
        record.tree = tree_key;
        record.leaf_id = params.leaf_id;
        record.owner = *staker_key;
        record.bump = bump;
    }
}

/// Loads and verifies an admission record passed via remaining accounts.
fn load_asset_record<'info>(
    info: &'info AccountInfo<'info>,
    entry: &StakeEntry,
) -> Result<Account<'info, AssetRecord>> {
    let asset_record: Account<AssetRecord> = Account::try_from(info)?;
    let (expected, _) = Pubkey::find_program_address(
        &[
            ASSET_RECORD_SEED,
            asset_record.collection.as_ref(),
            asset_record.mint.as_ref(),
        ],
        &crate::ID,
    );
    require_keys_eq!(expected, info.key(), ErrorCode::AssetRecordMismatch);
    require!(
        asset_record.collection == entry.collection && asset_record.mint == entry.mint,
        ErrorCode::AssetRecordMismatch
    );
    Ok(asset_record)
}

/// Verifies the (staker token account, vault token account) custody pair
/// for one staked asset.
fn check_custody_pair<'info>(
    user_token: &'info AccountInfo<'info>,
    vault_token: &'info AccountInfo<'info>,
    entry: &StakeEntry,
    staker_key: &Pubkey,
    vault_authority: &Pubkey,
) -> Result<()> {
    let user_account: Account<TokenAccount> = Account::try_from(user_token)?;
    require_keys_eq!(user_account.owner, *staker_key, ErrorCode::Unauthorized);
    require_keys_eq!(user_account.mint, entry.mint, ErrorCode::InvalidCustodyAccounts);
    require!(user_account.amount >= 1, ErrorCode::InvalidCustodyAccounts);

    let vault_account: Account<TokenAccount> = Account::try_from(vault_token)?;
    require_keys_eq!(
        vault_account.owner,
        *vault_authority,
        ErrorCode::InvalidCustodyAccounts
    );
    require_keys_eq!(vault_account.mint, entry.mint, ErrorCode::InvalidCustodyAccounts);
    Ok(())
}

/// The live version's store balance, when one is bound. Requiring the
/// store account only in that case keeps pre-activation staking free of
/// reward plumbing.
pub(crate) fn observed_store_balance<'info>(
    tree: &DistributionTree,
    leaf_id: u32,
    reward_store: Option<&Account<'info, TokenAccount>>,
) -> Result<Option<u64>> {
    let Some(version) = tree.leaf_active_version(leaf_id)? else {
        return Ok(None);
    };
    let Some(store_key) = tree.root_store(version)? else {
        return Ok(None);
    };
    let store = reward_store.ok_or(ErrorCode::RewardStoreRequired)?;
    require_keys_eq!(store.key(), store_key, ErrorCode::InvalidRewardStore);
    Ok(Some(store.amount))
}

fn pay_settlement<'info>(ctx: &Context<'_, '_, '_, 'info, Stake<'info>>, amount: u64) -> Result<()> {
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
        ctx.accounts.tree.key(),
        ctx.accounts.tree.authority_bump,
        ctx.accounts.staker.key(),
        ctx.accounts.tree.reward_mint,
        amount,
    )
}

/// Pays reward out of a store owned by the tree authority PDA. The
/// destination must be the recipient's account for the reward mint.
pub(crate) fn transfer_from_store<'info>(
    token_program: &Program<'info, Token>,
    store: &Account<'info, TokenAccount>,
    destination: &Account<'info, TokenAccount>,
    tree_authority: &UncheckedAccount<'info>,
    tree_key: Pubkey,
    authority_bump: u8,
    recipient: Pubkey,
    reward_mint: Pubkey,
    amount: u64,
) -> Result<()> {
    require_keys_eq!(destination.owner, recipient, ErrorCode::Unauthorized);
    require_keys_eq!(destination.mint, reward_mint, ErrorCode::InvalidRewardStore);
    anchor_spl::token::transfer(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            anchor_spl::token::Transfer {
                from: store.to_account_info(),
                to: destination.to_account_info(),
                authority: tree_authority.to_account_info(),
            },
            &[&[
                TREE_AUTHORITY_SEED,
                tree_key.as_ref(),
                &[authority_bump],
            ]],
        ),
        amount,
    )
}
