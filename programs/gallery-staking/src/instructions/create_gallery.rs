use anchor_lang::prelude::*;

use crate::constants::{GALLERY_SEED, LEAF_CONFIG_SEED};
use crate::errors::ErrorCode;
use crate::states::{DistributionTree, Gallery, LeafConfig};

#[derive(Accounts)]
#[instruction(params: CreateGalleryParams)]
pub struct CreateGallery<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    pub tree: Box<Account<'info, DistributionTree>>,

    #[account(
        mut,
        seeds = [LEAF_CONFIG_SEED, tree.key().as_ref(), &params.leaf_id.to_le_bytes()],
        bump = leaf_config.bump
    )]
    pub leaf_config: Box<Account<'info, LeafConfig>>,

    #[account(
        init,
        payer = owner,
        space = Gallery::DISCRIMINATOR.len() + Gallery::INIT_SPACE,
        seeds = [
            GALLERY_SEED,
            tree.key().as_ref(),
            &params.leaf_id.to_le_bytes(),
            &params.gallery_id.to_le_bytes()
        ],
        bump
    )]
    pub gallery: Box<Account<'info, Gallery>>,

    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct CreateGalleryParams {
    pub leaf_id: u32,
    /// Must equal the leaf's next free gallery id
    pub gallery_id: u32,
}

impl<'info> CreateGallery<'info> {
    pub fn handle(ctx: Context<CreateGallery>, params: CreateGalleryParams) -> Result<()> {
        let leaf_config = &mut ctx.accounts.leaf_config;
        require!(
            params.gallery_id == leaf_config.next_gallery_id,
            ErrorCode::InvalidGalleryId
        );
        leaf_config.next_gallery_id = leaf_config
            .next_gallery_id
            .checked_add(1)
            .ok_or(ErrorCode::MathOverflow)?;

        let slot_count = leaf_config.slot_count();
        let gallery = &mut ctx.accounts.gallery;
        gallery.tree = ctx.accounts.tree.key();
        gallery.leaf_id = params.leaf_id;
        gallery.id = params.gallery_id;
        gallery.owner = ctx.accounts.owner.key();
        gallery.shares = 0;
        gallery.slots = vec![None; slot_count as usize];
        gallery.locked = Vec::new();
        gallery.bump = ctx.bumps.gallery;

        msg!(
            "Gallery {} created in leaf {} with {} empty slot(s)",
            params.gallery_id,
            params.leaf_id,
            slot_count
        );

        emit!(crate::events::GalleryCreated {
            tree: ctx.accounts.tree.key(),
            leaf_id: params.leaf_id,
            gallery_id: params.gallery_id,
            gallery: gallery.key(),
            owner: ctx.accounts.owner.key(),
            slot_count,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}
