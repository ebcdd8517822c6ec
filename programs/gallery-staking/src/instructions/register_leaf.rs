use anchor_lang::prelude::*;

use crate::constants::{
    LEAF_CONFIG_SEED, MAX_ACCEPTED_VALUES, MAX_SLOTS, MAX_SLOT_REQUIREMENTS,
};
use crate::errors::ErrorCode;
use crate::states::{DistributionTree, LeafConfig, NodeKind, SlotDefinition};

#[derive(Accounts)]
#[instruction(params: RegisterLeafParams)]
pub struct RegisterLeaf<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,

    /// Slot configuration shared by every gallery of the leaf
    #[account(
        init,
        payer = admin,
        space = LeafConfig::DISCRIMINATOR.len() + LeafConfig::INIT_SPACE,
        seeds = [LEAF_CONFIG_SEED, tree.key().as_ref(), &params.node_id.to_le_bytes()],
        bump
    )]
    pub leaf_config: Box<Account<'info, LeafConfig>>,

    pub system_program: Program<'info, System>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct RegisterLeafParams {
    /// Must equal the next free arena index
    pub node_id: u32,
    /// Slot requirement sets, fixed for the leaf's lifetime
    pub slots: Vec<SlotDefinition>,
}

impl<'info> RegisterLeaf<'info> {
    pub fn handle(ctx: Context<RegisterLeaf>, params: RegisterLeafParams) -> Result<()> {
        require!(
            !params.slots.is_empty() && params.slots.len() <= MAX_SLOTS,
            ErrorCode::InvalidSlotCount
        );
        for slot in &params.slots {
            require!(
                slot.requirements.len() <= MAX_SLOT_REQUIREMENTS,
                ErrorCode::InvalidSlotCount
            );
            for requirement in &slot.requirements {
                require!(
                    !requirement.accepted_values.is_empty()
                        && requirement.accepted_values.len() <= MAX_ACCEPTED_VALUES,
                    ErrorCode::InvalidSlotCount
                );
            }
        }

        let tree = &mut ctx.accounts.tree;
        require!(
            params.node_id as usize == tree.nodes.len(),
            ErrorCode::InvalidNodeId
        );
        let node_id = tree.add_node(NodeKind::Leaf)?;

        let leaf_config = &mut ctx.accounts.leaf_config;
        leaf_config.tree = tree.key();
        leaf_config.node_id = node_id;
        leaf_config.slots = params.slots;
        leaf_config.next_gallery_id = 0;
        leaf_config.bump = ctx.bumps.leaf_config;

        msg!(
            "Leaf node {} registered with {} slot(s)",
            node_id,
            leaf_config.slots.len()
        );

        emit!(crate::events::NodeAdded {
            tree: tree.key(),
            node_id,
            is_leaf: true,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}
