use anchor_lang::prelude::*;

/// Event emitted when a distribution tree is initialized
#[event]
pub struct TreeInitialized {
    /// The tree account
    pub tree: Pubkey,
    /// Admin for privileged operations
    pub admin: Pubkey,
    /// Trusted signer for gallery ownership transfers
    pub transfer_authority: Pubkey,
    /// Reward token mint
    pub reward_mint: Pubkey,
    /// Lock period applied to displaced assets (seconds)
    pub unstake_lock_period: i64,
    /// Timestamp of initialization
    pub timestamp: i64,
}

/// Event emitted when a node is appended to the tree arena
#[event]
pub struct NodeAdded {
    /// The tree account
    pub tree: Pubkey,
    /// Arena id of the new node
    pub node_id: u32,
    /// True for leaf nodes, false for routing nodes
    pub is_leaf: bool,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a child/weight pair is appended to a version
#[event]
pub struct ChildAdded {
    /// The tree account
    pub tree: Pubkey,
    /// Parent node id
    pub parent_id: u32,
    /// Configuration version
    pub version: u16,
    /// Child node id
    pub child_id: u32,
    /// Child weight within the version
    pub weight: u64,
    /// New total weight of the parent's version
    pub total_weight: u64,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a child records its upward link for a version
#[event]
pub struct VersionBound {
    /// The tree account
    pub tree: Pubkey,
    /// Child node id
    pub child_id: u32,
    /// Configuration version
    pub version: u16,
    /// Parent node id
    pub parent_id: u32,
    /// Index of the child in the parent's child list
    pub child_index: u16,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a routing node's version goes live
#[event]
pub struct NodeVersionActivated {
    /// The tree account
    pub tree: Pubkey,
    /// Routing node id
    pub node_id: u32,
    /// Configuration version
    pub version: u16,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when the root version is activated and a reward store bound
#[event]
pub struct VersionActivated {
    /// The tree account
    pub tree: Pubkey,
    /// Configuration version
    pub version: u16,
    /// The bound reward store token account
    pub reward_store: Pubkey,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a gallery (staking position) is created
#[event]
pub struct GalleryCreated {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id the gallery belongs to
    pub leaf_id: u32,
    /// Gallery id within the leaf
    pub gallery_id: u32,
    /// The gallery account
    pub gallery: Pubkey,
    /// Initial owner
    pub owner: Pubkey,
    /// Number of slots
    pub slot_count: u32,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted for each asset staked into a slot
#[event]
pub struct AssetStaked {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id
    pub leaf_id: u32,
    /// Gallery id
    pub gallery_id: u32,
    /// Slot index
    pub slot_id: u32,
    /// Asset collection
    pub collection: Pubkey,
    /// Asset mint
    pub mint: Pubkey,
    /// Admission weight of the asset
    pub weight: u64,
    /// True if a previous occupant was displaced into the lock queue
    pub replaced: bool,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted for each asset unstaked into the lock queue
#[event]
pub struct AssetUnstaked {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id
    pub leaf_id: u32,
    /// Gallery id
    pub gallery_id: u32,
    /// Slot index the asset left
    pub slot_id: u32,
    /// Asset collection
    pub collection: Pubkey,
    /// Asset mint
    pub mint: Pubkey,
    /// When the withdrawal unlocks
    pub unlock_at: i64,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted for each locked withdrawal returned to its owner
#[event]
pub struct UnlockedAssetClaimed {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id
    pub leaf_id: u32,
    /// Gallery id
    pub gallery_id: u32,
    /// Asset collection
    pub collection: Pubkey,
    /// Asset mint
    pub mint: Pubkey,
    /// Receiving owner
    pub owner: Pubkey,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a staker's pending reward is settled during a
/// share-changing operation (stake, unstake, ownership transfer)
#[event]
pub struct RewardSettled {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id
    pub leaf_id: u32,
    /// Settled version
    pub version: u16,
    /// The staker
    pub staker: Pubkey,
    /// Amount paid out
    pub amount: u64,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a staker claims pending reward
#[event]
pub struct RewardClaimed {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id
    pub leaf_id: u32,
    /// Claimed version
    pub version: u16,
    /// The staker
    pub staker: Pubkey,
    /// Amount transferred (zero for a settled no-op)
    pub amount: u64,
    /// Staker shares at claim time
    pub shares: u64,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when a gallery changes owner through the transfer hook
#[event]
pub struct GalleryTransferred {
    /// The tree account
    pub tree: Pubkey,
    /// Leaf node id
    pub leaf_id: u32,
    /// Gallery id
    pub gallery_id: u32,
    /// Previous owner
    pub from: Pubkey,
    /// New owner
    pub to: Pubkey,
    /// Shares moved with the gallery
    pub shares: u64,
    /// Pending reward paid to the previous owner
    pub settled_amount: u64,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when the unstake lock period changes
#[event]
pub struct UnstakeLockPeriodChanged {
    /// The tree account
    pub tree: Pubkey,
    /// Previous lock period (seconds)
    pub previous: i64,
    /// New lock period (seconds)
    pub current: i64,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when an asset collection is whitelisted
#[event]
pub struct CollectionWhitelisted {
    /// The tree account
    pub tree: Pubkey,
    /// The collection
    pub collection: Pubkey,
    /// Timestamp
    pub timestamp: i64,
}

/// Event emitted when an asset's admission record is registered
#[event]
pub struct AssetRegistered {
    /// Asset collection
    pub collection: Pubkey,
    /// Asset mint
    pub mint: Pubkey,
    /// Admission weight
    pub weight: u64,
    /// Number of recorded traits
    pub trait_count: u32,
    /// Timestamp
    pub timestamp: i64,
}
