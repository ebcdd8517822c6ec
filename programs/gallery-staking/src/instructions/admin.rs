use anchor_lang::prelude::*;

use crate::constants::{
    ASSET_RECORD_SEED, DEFAULT_ASSET_WEIGHT, MAX_ASSET_TRAITS, MAX_UNSTAKE_LOCK_PERIOD,
};
use crate::errors::ErrorCode;
use crate::states::{AssetRecord, DistributionTree, TraitValue};

/// Changes the lock duration applied to future displacements.
#[derive(Accounts)]
pub struct SetUnstakeLockPeriod<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct SetUnstakeLockPeriodParams {
    pub seconds: i64,
}

impl<'info> SetUnstakeLockPeriod<'info> {
    pub fn handle(ctx: Context<SetUnstakeLockPeriod>, params: SetUnstakeLockPeriodParams) -> Result<()> {
        require!(
            (0..=MAX_UNSTAKE_LOCK_PERIOD).contains(&params.seconds),
            ErrorCode::InvalidLockPeriod
        );

        let tree = &mut ctx.accounts.tree;
        let previous = tree.unstake_lock_period;
        tree.unstake_lock_period = params.seconds;

        msg!("Unstake lock period changed: {} -> {}", previous, params.seconds);

        emit!(crate::events::UnstakeLockPeriodChanged {
            tree: tree.key(),
            previous,
            current: params.seconds,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

/// Adds an asset collection to the admission whitelist.
#[derive(Accounts)]
pub struct WhitelistCollection<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct WhitelistCollectionParams {
    pub collection: Pubkey,
}

impl<'info> WhitelistCollection<'info> {
    pub fn handle(ctx: Context<WhitelistCollection>, params: WhitelistCollectionParams) -> Result<()> {
        let tree = &mut ctx.accounts.tree;
        let added = tree.whitelist_collection(params.collection)?;

        if added {
            msg!("Collection {} whitelisted", params.collection);
            emit!(crate::events::CollectionWhitelisted {
                tree: tree.key(),
                collection: params.collection,
                timestamp: Clock::get()?.unix_timestamp,
            });
        } else {
            msg!("Collection {} already whitelisted", params.collection);
        }

        Ok(())
    }
}

/// Registers the admission record of one asset: its weight and traits.
#[derive(Accounts)]
#[instruction(params: RegisterAssetParams)]
pub struct RegisterAsset<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,

    #[account(
        init,
        payer = admin,
        space = AssetRecord::DISCRIMINATOR.len() + AssetRecord::INIT_SPACE,
        seeds = [
            ASSET_RECORD_SEED,
            params.collection.as_ref(),
            params.mint.as_ref()
        ],
        bump
    )]
    pub asset_record: Box<Account<'info, AssetRecord>>,

    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct RegisterAssetParams {
    pub collection: Pubkey,
    pub mint: Pubkey,
    /// Admission weight; zero selects the default
    pub weight: u64,
    pub traits: Vec<TraitValue>,
}

impl<'info> RegisterAsset<'info> {
    pub fn handle(ctx: Context<RegisterAsset>, params: RegisterAssetParams) -> Result<()> {
        require!(
            params.traits.len() <= MAX_ASSET_TRAITS,
            ErrorCode::AssetRecordMismatch
        );

        let weight = if params.weight == 0 {
            DEFAULT_ASSET_WEIGHT
        } else {
            params.weight
        };

        let asset_record = &mut ctx.accounts.asset_record;
        asset_record.collection = params.collection;
        asset_record.mint = params.mint;
        asset_record.weight = weight;
        asset_record.traits = params.traits;
        asset_record.bump = ctx.bumps.asset_record;

        msg!(
            "Asset {} of collection {} registered with weight {}",
            params.mint,
            params.collection,
            weight
        );

        emit!(crate::events::AssetRegistered {
            collection: params.collection,
            mint: params.mint,
            weight,
            trait_count: asset_record.traits.len() as u32,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}
