use anchor_lang::prelude::*;

use crate::errors::ErrorCode;
use crate::states::{DistributionTree, NodeKind};

/// Appends a routing node to the tree arena
#[derive(Accounts)]
pub struct AddRoutingNode<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct AddRoutingNodeParams {
    /// Must equal the next free arena index
    pub node_id: u32,
}

impl<'info> AddRoutingNode<'info> {
    pub fn handle(ctx: Context<AddRoutingNode>, params: AddRoutingNodeParams) -> Result<()> {
        let tree = &mut ctx.accounts.tree;
        require!(
            params.node_id as usize == tree.nodes.len(),
            ErrorCode::InvalidNodeId
        );
        let node_id = tree.add_node(NodeKind::Routing)?;

        msg!("Routing node {} added", node_id);

        emit!(crate::events::NodeAdded {
            tree: tree.key(),
            node_id,
            is_leaf: false,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

/// Appends a child/weight pair to a routing node's configuring version
#[derive(Accounts)]
pub struct AddChild<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct AddChildParams {
    pub parent_id: u32,
    pub version: u16,
    pub child_id: u32,
    pub weight: u64,
}

impl<'info> AddChild<'info> {
    pub fn handle(ctx: Context<AddChild>, params: AddChildParams) -> Result<()> {
        let tree = &mut ctx.accounts.tree;
        tree.add_child(params.parent_id, params.version, params.child_id, params.weight)?;

        let total_weight = tree
            .node(params.parent_id)?
            .version_entry(params.version)
            .ok_or(ErrorCode::VersionNotFound)?
            .total_weight;

        msg!(
            "Child {} (weight {}) added to node {} version {}",
            params.child_id,
            params.weight,
            params.parent_id,
            params.version
        );

        emit!(crate::events::ChildAdded {
            tree: tree.key(),
            parent_id: params.parent_id,
            version: params.version,
            child_id: params.child_id,
            weight: params.weight,
            total_weight,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

/// Records the upward link on a child node for a version
#[derive(Accounts)]
pub struct BindVersion<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct BindVersionParams {
    pub child_id: u32,
    pub version: u16,
    pub parent_id: u32,
    pub child_index: u16,
}

impl<'info> BindVersion<'info> {
    pub fn handle(ctx: Context<BindVersion>, params: BindVersionParams) -> Result<()> {
        let tree = &mut ctx.accounts.tree;
        tree.bind_child(
            params.child_id,
            params.version,
            params.parent_id,
            params.child_index,
        )?;

        msg!(
            "Node {} bound to parent {} (index {}) for version {}",
            params.child_id,
            params.parent_id,
            params.child_index,
            params.version
        );

        emit!(crate::events::VersionBound {
            tree: tree.key(),
            child_id: params.child_id,
            version: params.version,
            parent_id: params.parent_id,
            child_index: params.child_index,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}

/// Activates a routing node's version. Every routing node activates
/// independently of its ancestors and descendants.
#[derive(Accounts)]
pub struct ActivateNodeVersion<'info> {
    pub admin: Signer<'info>,

    #[account(mut, has_one = admin @ ErrorCode::Unauthorized)]
    pub tree: Box<Account<'info, DistributionTree>>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct ActivateNodeVersionParams {
    pub node_id: u32,
    pub version: u16,
}

impl<'info> ActivateNodeVersion<'info> {
    pub fn handle(ctx: Context<ActivateNodeVersion>, params: ActivateNodeVersionParams) -> Result<()> {
        let tree = &mut ctx.accounts.tree;
        tree.activate_routing_version(params.node_id, params.version)?;

        msg!(
            "Version {} activated on routing node {}",
            params.version,
            params.node_id
        );

        emit!(crate::events::NodeVersionActivated {
            tree: tree.key(),
            node_id: params.node_id,
            version: params.version,
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(())
    }
}
