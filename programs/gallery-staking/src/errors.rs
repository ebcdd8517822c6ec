use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Caller is not authorized for this operation")]
    Unauthorized,
    #[msg("Slot index out of range")]
    InvalidSlot,
    #[msg("Asset does not satisfy the slot's trait requirements")]
    SlotRequirementNotMet,
    #[msg("Asset collection is not whitelisted")]
    AssetNotWhitelisted,
    #[msg("Slot is occupied and replace flag is not set")]
    SlotOccupiedWithoutReplace,
    #[msg("Slot does not hold the specified asset")]
    AssetMismatch,
    #[msg("Withdrawal is still locked")]
    WithdrawalLocked,
    #[msg("Withdrawal indices must be strictly descending and in range")]
    WithdrawalIndexOrder,
    #[msg("Reward source is already bound to a version")]
    RewardSourceAlreadyBound,
    #[msg("Version is not in the configuring state")]
    VersionNotConfiguring,
    #[msg("Version not found on this node")]
    VersionNotFound,
    #[msg("Version is not active")]
    VersionNotActive,
    #[msg("Node not found in the distribution tree")]
    NodeNotFound,
    #[msg("Node id must equal the next free arena index")]
    InvalidNodeId,
    #[msg("Operation is only valid on a routing node")]
    NotARoutingNode,
    #[msg("Operation is only valid on a leaf node")]
    NotALeafNode,
    #[msg("Child is already listed for this version")]
    DuplicateChild,
    #[msg("Child is already bound to a parent for this version")]
    ChildAlreadyBound,
    #[msg("Child index does not match the parent's child list")]
    InvalidChildIndex,
    #[msg("Node cannot be used as a child here")]
    InvalidChild,
    #[msg("Child weight must be greater than zero")]
    InvalidChildWeight,
    #[msg("Tree depth limit exceeded while walking to the root")]
    TreeDepthExceeded,
    #[msg("Distribution tree node limit reached")]
    NodeLimitReached,
    #[msg("Version limit reached for this node")]
    VersionLimitReached,
    #[msg("Child limit reached for this version")]
    ChildLimitReached,
    #[msg("Reward store account does not match the bound reward source")]
    InvalidRewardStore,
    #[msg("Reward store account is required for settlement")]
    RewardStoreRequired,
    #[msg("Locked-withdrawal queue is full")]
    WithdrawalQueueFull,
    #[msg("Custody accounts are missing or malformed")]
    InvalidCustodyAccounts,
    #[msg("Asset record does not match the staked asset")]
    AssetRecordMismatch,
    #[msg("No stake entries provided")]
    EmptyStakeBatch,
    #[msg("Slot count out of range for a leaf")]
    InvalidSlotCount,
    #[msg("Gallery id must equal the leaf's next free id")]
    InvalidGalleryId,
    #[msg("Lock period out of range")]
    InvalidLockPeriod,
    #[msg("Whitelist capacity reached")]
    WhitelistFull,
    #[msg("Math overflow occurred during calculation")]
    MathOverflow,
}
