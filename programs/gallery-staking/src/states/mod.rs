pub mod asset_record;
pub mod distribution_tree;
pub mod gallery;
pub mod leaf_config;
pub mod staker_record;

pub use asset_record::*;
pub use distribution_tree::*;
pub use gallery::*;
pub use leaf_config::*;
pub use staker_record::*;
