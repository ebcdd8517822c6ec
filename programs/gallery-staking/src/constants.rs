// PDA Seeds
pub const TREE_SEED: &[u8] = b"tree";
pub const TREE_AUTHORITY_SEED: &[u8] = b"tree_authority";
pub const LEAF_CONFIG_SEED: &[u8] = b"leaf_config";
pub const GALLERY_SEED: &[u8] = b"gallery";
pub const STAKER_RECORD_SEED: &[u8] = b"staker_record";
pub const ASSET_RECORD_SEED: &[u8] = b"asset_record";

// Fixed-point scale for the per-share reward accumulators
pub const PRECISION: u128 = 1_000_000_000_000; // 1e12

// Tree layout bounds
pub const ROOT_NODE_ID: u32 = 0;
pub const MAX_NODES: usize = 12;
pub const MAX_VERSIONS: usize = 3;
pub const MAX_CHILDREN: usize = 6;
pub const MAX_TREE_DEPTH: usize = 8;

// Slot / admission bounds
pub const MAX_SLOTS: usize = 8;
pub const MAX_SLOT_REQUIREMENTS: usize = 4;
pub const MAX_ACCEPTED_VALUES: usize = 8;
pub const MAX_ASSET_TRAITS: usize = 8;
pub const MAX_WHITELISTED_COLLECTIONS: usize = 16;

// Locked-withdrawal queue bound per gallery
pub const MAX_LOCKED_WITHDRAWALS: usize = 16;

// Default policy parameters
pub const DEFAULT_ASSET_WEIGHT: u64 = 1000;
pub const MAX_UNSTAKE_LOCK_PERIOD: i64 = 365 * 86400; // one year
