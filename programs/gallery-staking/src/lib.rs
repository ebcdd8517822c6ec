use anchor_lang::prelude::*;

declare_id!("FAgk54mcwJFvHD76YaB5sZzqXCEhUCVpP3cBvggKabcd");

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod states;

pub use events::*;
pub use instructions::*;

#[program]
pub mod gallery_staking {
    use super::*;

    pub fn initialize_tree(ctx: Context<InitializeTree>, params: InitializeTreeParams) -> Result<()> {
        InitializeTree::handle(ctx, params)
    }

    pub fn add_routing_node(ctx: Context<AddRoutingNode>, params: AddRoutingNodeParams) -> Result<()> {
        AddRoutingNode::handle(ctx, params)
    }

    pub fn register_leaf(ctx: Context<RegisterLeaf>, params: RegisterLeafParams) -> Result<()> {
        RegisterLeaf::handle(ctx, params)
    }

    pub fn add_child(ctx: Context<AddChild>, params: AddChildParams) -> Result<()> {
        AddChild::handle(ctx, params)
    }

    pub fn bind_version(ctx: Context<BindVersion>, params: BindVersionParams) -> Result<()> {
        BindVersion::handle(ctx, params)
    }

    pub fn activate_node_version(
        ctx: Context<ActivateNodeVersion>,
        params: ActivateNodeVersionParams,
    ) -> Result<()> {
        ActivateNodeVersion::handle(ctx, params)
    }

    pub fn activate_version(ctx: Context<ActivateVersion>, params: ActivateVersionParams) -> Result<()> {
        ActivateVersion::handle(ctx, params)
    }

    pub fn create_gallery(ctx: Context<CreateGallery>, params: CreateGalleryParams) -> Result<()> {
        CreateGallery::handle(ctx, params)
    }

    pub fn stake<'info>(
        ctx: Context<'_, '_, 'info, 'info, Stake<'info>>,
        params: StakeParams,
    ) -> Result<()> {
        Stake::handle(ctx, params)
    }

    pub fn unstake(ctx: Context<Unstake>, params: UnstakeParams) -> Result<()> {
        Unstake::handle(ctx, params)
    }

    pub fn claim_unlocked<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimUnlocked<'info>>,
        params: ClaimUnlockedParams,
    ) -> Result<()> {
        ClaimUnlocked::handle(ctx, params)
    }

    pub fn claim_reward(ctx: Context<ClaimReward>, params: ClaimRewardParams) -> Result<()> {
        ClaimReward::handle(ctx, params)
    }

    pub fn get_current_reward_amount(
        ctx: Context<GetCurrentRewardAmount>,
        params: GetCurrentRewardAmountParams,
    ) -> Result<u64> {
        GetCurrentRewardAmount::handle(ctx, params)
    }

    pub fn query_gallery(ctx: Context<QueryGallery>, params: QueryGalleryParams) -> Result<GalleryView> {
        QueryGallery::handle(ctx, params)
    }

    pub fn prepare_gallery_transfer(
        ctx: Context<PrepareGalleryTransfer>,
        params: PrepareGalleryTransferParams,
    ) -> Result<()> {
        PrepareGalleryTransfer::handle(ctx, params)
    }

    pub fn set_unstake_lock_period(
        ctx: Context<SetUnstakeLockPeriod>,
        params: SetUnstakeLockPeriodParams,
    ) -> Result<()> {
        SetUnstakeLockPeriod::handle(ctx, params)
    }

    pub fn whitelist_collection(
        ctx: Context<WhitelistCollection>,
        params: WhitelistCollectionParams,
    ) -> Result<()> {
        WhitelistCollection::handle(ctx, params)
    }

    pub fn register_asset(ctx: Context<RegisterAsset>, params: RegisterAssetParams) -> Result<()> {
        RegisterAsset::handle(ctx, params)
    }
}
