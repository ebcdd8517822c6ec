use anchor_lang::prelude::*;
use ruint::aliases::U256;

use crate::constants::{
    MAX_CHILDREN, MAX_NODES, MAX_TREE_DEPTH, MAX_VERSIONS, MAX_WHITELISTED_COLLECTIONS,
    PRECISION, ROOT_NODE_ID,
};
use crate::errors::ErrorCode;
use crate::states::staker_record::StakerRecord;

/// Kind of a distribution node. Routing nodes forward weighted shares of
/// pulled funds to children; leaf nodes own galleries and pay claims.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum NodeKind {
    Routing,
    Leaf,
}

/// Lifecycle of a version entry. Configuring versions accept structural
/// changes; active versions are frozen and participate in distribution.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum VersionState {
    Configuring,
    Active,
}

/// A weighted child reference held by a routing node's version.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct ChildRef {
    pub node_id: u32,
    pub weight: u64,
}

/// Upward link recorded on a child when it is bound into a parent's version.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct ParentLink {
    pub parent_id: u32,
    pub child_index: u16,
}

/// Per-version state of a node: configured structure plus the reward
/// accumulator. `cumulative_per_share` is scaled by `PRECISION` and only
/// ever grows for the lifetime of the version.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, InitSpace)]
pub struct VersionEntry {
    pub version: u16,
    pub state: VersionState,
    /// Child list (routing nodes only), frozen at activation
    #[max_len(MAX_CHILDREN)]
    pub children: Vec<ChildRef>,
    /// Sum of child weights
    pub total_weight: u64,
    /// Upward link, set once by `bind_child`
    pub parent: Option<ParentLink>,
    /// Reward earned per unit share, scaled by `PRECISION`
    pub cumulative_per_share: u128,
    /// Parent accumulator value this node last settled against
    pub parent_snapshot: u128,
    /// Root only: reward-store balance already accounted for
    pub last_observed_balance: u64,
    /// Root only: the bound reward store token account
    pub reward_store: Pubkey,
}

impl VersionEntry {
    fn new(version: u16) -> Self {
        Self {
            version,
            state: VersionState::Configuring,
            children: Vec::new(),
            total_weight: 0,
            parent: None,
            cumulative_per_share: 0,
            parent_snapshot: 0,
            last_observed_balance: 0,
            reward_store: Pubkey::default(),
        }
    }
}

/// A node in the distribution tree arena. Nodes are referenced by arena
/// index only; parents never hold owning pointers to children.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, InitSpace)]
pub struct DistributionNode {
    pub kind: NodeKind,
    /// Leaf only: sum of all staker shares, shared across versions
    pub total_shares: u64,
    /// The version currently bound for live distribution, if any
    pub active_version: Option<u16>,
    #[max_len(MAX_VERSIONS)]
    pub versions: Vec<VersionEntry>,
}

impl DistributionNode {
    pub fn version_entry(&self, version: u16) -> Option<&VersionEntry> {
        self.versions.iter().find(|entry| entry.version == version)
    }

    pub fn version_entry_mut(&mut self, version: u16) -> Option<&mut VersionEntry> {
        self.versions.iter_mut().find(|entry| entry.version == version)
    }
}

/// The distribution tree account: node arena, reward-source bindings and
/// the asset-contract whitelist, plus the staking policy parameters.
#[account]
#[derive(InitSpace)]
pub struct DistributionTree {
    /// Admin for privileged operations
    pub admin: Pubkey,
    /// Trusted signer for gallery ownership transfers
    pub transfer_authority: Pubkey,
    /// Mint of the reward token
    pub reward_mint: Pubkey,
    /// Seconds a displaced asset stays locked before it can be claimed
    pub unstake_lock_period: i64,
    /// Node arena; node id is the index, node 0 is the root
    #[max_len(MAX_NODES)]
    pub nodes: Vec<DistributionNode>,
    /// Every reward store ever bound, for exactly-once enforcement
    #[max_len(MAX_VERSIONS)]
    pub bound_stores: Vec<Pubkey>,
    /// Whitelisted asset collections
    #[max_len(MAX_WHITELISTED_COLLECTIONS)]
    pub whitelisted_collections: Vec<Pubkey>,
    /// Bump of the tree authority PDA that owns vaults and reward stores
    pub authority_bump: u8,
    /// Bump seed for this PDA
    pub bump: u8,
}

/// New accumulator values for one node, produced by `compute_pull`.
pub struct NodeUpdate {
    pub node_id: u32,
    pub cumulative_per_share: u128,
    pub parent_snapshot: u128,
}

/// The outcome of walking the pull chain for a leaf. Reading the plan is
/// the simulation; `apply_pull` commits it. Both modes share this one
/// computation, so their numbers cannot diverge.
pub struct PullPlan {
    pub version: u16,
    pub updates: Vec<NodeUpdate>,
    pub new_root_observed: Option<u64>,
    pub leaf_cumulative_per_share: u128,
}

/// Result of settling a staker against the live version.
pub struct SettlementOutcome {
    pub version: u16,
    pub amount: u64,
}

/// Floor of `a * b / divisor` with a 256-bit intermediate product.
pub fn mul_div_floor(a: u128, b: u128, divisor: u128) -> Result<u128> {
    require!(divisor > 0, ErrorCode::MathOverflow);
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(ErrorCode::MathOverflow)?;
    u128::try_from(product / U256::from(divisor)).map_err(|_| error!(ErrorCode::MathOverflow))
}

/// Reward accrued by `shares` between two accumulator observations.
pub fn pending_amount(shares: u64, cumulative_per_share: u128, snapshot: u128) -> Result<u64> {
    let accrued = cumulative_per_share
        .checked_sub(snapshot)
        .ok_or(ErrorCode::MathOverflow)?;
    let amount = mul_div_floor(shares as u128, accrued, PRECISION)?;
    u64::try_from(amount).map_err(|_| error!(ErrorCode::MathOverflow))
}

impl DistributionTree {
    pub fn node(&self, node_id: u32) -> Result<&DistributionNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or_else(|| error!(ErrorCode::NodeNotFound))
    }

    pub fn node_mut(&mut self, node_id: u32) -> Result<&mut DistributionNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or_else(|| error!(ErrorCode::NodeNotFound))
    }

    /// Appends a node to the arena and returns its id.
    pub fn add_node(&mut self, kind: NodeKind) -> Result<u32> {
        require!(self.nodes.len() < MAX_NODES, ErrorCode::NodeLimitReached);
        let node_id = self.nodes.len() as u32;
        self.nodes.push(DistributionNode {
            kind,
            total_shares: 0,
            active_version: None,
            versions: Vec::new(),
        });
        Ok(node_id)
    }

    fn ensure_version_mut(&mut self, node_id: u32, version: u16) -> Result<&mut VersionEntry> {
        let node = self.node_mut(node_id)?;
        if node.version_entry(version).is_none() {
            require!(node.versions.len() < MAX_VERSIONS, ErrorCode::VersionLimitReached);
            node.versions.push(VersionEntry::new(version));
        }
        node.version_entry_mut(version)
            .ok_or_else(|| error!(ErrorCode::VersionNotFound))
    }

    fn child_ref(&self, parent_id: u32, version: u16, child_index: u16) -> Result<ChildRef> {
        let entry = self
            .node(parent_id)?
            .version_entry(version)
            .ok_or(ErrorCode::VersionNotFound)?;
        entry
            .children
            .get(child_index as usize)
            .copied()
            .ok_or_else(|| error!(ErrorCode::InvalidChildIndex))
    }

    /// Appends a child/weight pair to a routing node's configuring version.
    pub fn add_child(
        &mut self,
        parent_id: u32,
        version: u16,
        child_id: u32,
        weight: u64,
    ) -> Result<()> {
        require!(weight > 0, ErrorCode::InvalidChildWeight);
        require!(child_id != ROOT_NODE_ID, ErrorCode::InvalidChild);
        require!(child_id != parent_id, ErrorCode::InvalidChild);
        self.node(child_id)?;
        require!(
            self.node(parent_id)?.kind == NodeKind::Routing,
            ErrorCode::NotARoutingNode
        );
        let entry = self.ensure_version_mut(parent_id, version)?;
        require!(
            entry.state == VersionState::Configuring,
            ErrorCode::VersionNotConfiguring
        );
        require!(entry.children.len() < MAX_CHILDREN, ErrorCode::ChildLimitReached);
        require!(
            entry.children.iter().all(|child| child.node_id != child_id),
            ErrorCode::DuplicateChild
        );
        entry.children.push(ChildRef { node_id: child_id, weight });
        entry.total_weight = entry
            .total_weight
            .checked_add(weight)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    /// Records the upward link on a child for a version. A (child, version)
    /// pair binds at most once. Binding a leaf puts its version live right
    /// away; routing nodes stay in Configuring until explicitly activated.
    pub fn bind_child(
        &mut self,
        child_id: u32,
        version: u16,
        parent_id: u32,
        child_index: u16,
    ) -> Result<()> {
        require!(child_id != ROOT_NODE_ID, ErrorCode::InvalidChild);
        let listed = self.child_ref(parent_id, version, child_index)?;
        require!(listed.node_id == child_id, ErrorCode::InvalidChildIndex);
        let child_kind = self.node(child_id)?.kind;
        let entry = self.ensure_version_mut(child_id, version)?;
        require!(entry.parent.is_none(), ErrorCode::ChildAlreadyBound);
        entry.parent = Some(ParentLink {
            parent_id,
            child_index,
        });
        if child_kind == NodeKind::Leaf {
            entry.state = VersionState::Active;
            self.node_mut(child_id)?.active_version = Some(version);
        }
        Ok(())
    }

    /// Freezes a routing node's version and marks it live for that node.
    /// Each routing node activates independently; until then its subtree
    /// receives nothing and the owed funds stay retained at its parent.
    pub fn activate_routing_version(&mut self, node_id: u32, version: u16) -> Result<()> {
        require!(node_id != ROOT_NODE_ID, ErrorCode::NotARoutingNode);
        let node = self.node_mut(node_id)?;
        require!(node.kind == NodeKind::Routing, ErrorCode::NotARoutingNode);
        let entry = node
            .version_entry_mut(version)
            .ok_or(ErrorCode::VersionNotFound)?;
        require!(
            entry.state == VersionState::Configuring,
            ErrorCode::VersionNotConfiguring
        );
        entry.state = VersionState::Active;
        node.active_version = Some(version);
        Ok(())
    }

    /// Activates the root's version and permanently binds its reward store.
    /// A store binds to at most one version over the tree's whole lifetime.
    pub fn activate_root_version(&mut self, version: u16, reward_store: Pubkey) -> Result<()> {
        require!(reward_store != Pubkey::default(), ErrorCode::InvalidRewardStore);
        require!(
            !self.bound_stores.contains(&reward_store),
            ErrorCode::RewardSourceAlreadyBound
        );
        require!(
            self.bound_stores.len() < MAX_VERSIONS,
            ErrorCode::VersionLimitReached
        );
        let root = self.node_mut(ROOT_NODE_ID)?;
        let entry = root
            .version_entry_mut(version)
            .ok_or(ErrorCode::VersionNotFound)?;
        require!(
            entry.state == VersionState::Configuring,
            ErrorCode::VersionNotConfiguring
        );
        entry.state = VersionState::Active;
        entry.reward_store = reward_store;
        entry.last_observed_balance = 0;
        root.active_version = Some(version);
        self.bound_stores.push(reward_store);
        Ok(())
    }

    /// The reward store bound to a version at the root, if any.
    pub fn root_store(&self, version: u16) -> Result<Option<Pubkey>> {
        let root = self.node(ROOT_NODE_ID)?;
        Ok(root.version_entry(version).and_then(|entry| {
            (entry.reward_store != Pubkey::default()).then_some(entry.reward_store)
        }))
    }

    /// The live version of a leaf node, if one is bound.
    pub fn leaf_active_version(&self, leaf_id: u32) -> Result<Option<u16>> {
        let node = self.node(leaf_id)?;
        require!(node.kind == NodeKind::Leaf, ErrorCode::NotALeafNode);
        Ok(node.active_version)
    }

    /// Walks parent links from a leaf to the root. Returns the ids in
    /// root-to-leaf order, or `None` while some ancestor is still unbound.
    fn chain_to_root(&self, leaf_id: u32, version: u16) -> Result<Option<Vec<u32>>> {
        let mut chain = vec![leaf_id];
        let mut current = leaf_id;
        for _ in 0..MAX_TREE_DEPTH {
            if current == ROOT_NODE_ID {
                chain.reverse();
                return Ok(Some(chain));
            }
            let entry = self
                .node(current)?
                .version_entry(version)
                .ok_or(ErrorCode::VersionNotFound)?;
            match entry.parent {
                None => return Ok(None),
                Some(link) => {
                    let listed = self.child_ref(link.parent_id, version, link.child_index)?;
                    require!(listed.node_id == current, ErrorCode::InvalidChildIndex);
                    chain.push(link.parent_id);
                    current = link.parent_id;
                }
            }
        }
        err!(ErrorCode::TreeDepthExceeded)
    }

    /// Computes the full pull chain for a leaf against the current reward
    /// store balance without mutating anything. Nodes that cannot
    /// incorporate (inactive version, zero weight, zero shares) keep their
    /// snapshot, so the funds they would have taken remain claimable later.
    pub fn compute_pull(&self, leaf_id: u32, version: u16, store_balance: u64) -> Result<PullPlan> {
        let leaf = self.node(leaf_id)?;
        require!(leaf.kind == NodeKind::Leaf, ErrorCode::NotALeafNode);
        let leaf_entry = leaf
            .version_entry(version)
            .ok_or(ErrorCode::VersionNotFound)?;
        let Some(chain) = self.chain_to_root(leaf_id, version)? else {
            return Ok(PullPlan {
                version,
                updates: Vec::new(),
                new_root_observed: None,
                leaf_cumulative_per_share: leaf_entry.cumulative_per_share,
            });
        };

        let mut updates = Vec::with_capacity(chain.len());
        let mut new_root_observed = None;
        let mut parent_cps: u128 = 0;
        for (depth, &node_id) in chain.iter().enumerate() {
            let node = self.node(node_id)?;
            let entry = node
                .version_entry(version)
                .ok_or(ErrorCode::VersionNotFound)?;
            let mut cumulative = entry.cumulative_per_share;
            let mut snapshot = entry.parent_snapshot;

            if depth == 0 {
                if entry.state == VersionState::Active && entry.total_weight > 0 {
                    let delta = store_balance
                        .checked_sub(entry.last_observed_balance)
                        .ok_or(ErrorCode::MathOverflow)?;
                    if delta > 0 {
                        cumulative = cumulative
                            .checked_add(mul_div_floor(
                                delta as u128,
                                PRECISION,
                                entry.total_weight as u128,
                            )?)
                            .ok_or(ErrorCode::MathOverflow)?;
                        new_root_observed = Some(store_balance);
                    }
                }
            } else {
                let link = entry.parent.ok_or(ErrorCode::VersionNotFound)?;
                let child = self.child_ref(link.parent_id, version, link.child_index)?;
                let accrued = parent_cps
                    .checked_sub(entry.parent_snapshot)
                    .ok_or(ErrorCode::MathOverflow)?;
                let entitled = u64::try_from(mul_div_floor(
                    child.weight as u128,
                    accrued,
                    PRECISION,
                )?)
                .map_err(|_| error!(ErrorCode::MathOverflow))?;
                let divisor = match node.kind {
                    NodeKind::Routing => entry.total_weight,
                    NodeKind::Leaf => node.total_shares,
                };
                if entry.state == VersionState::Active && divisor > 0 && entitled > 0 {
                    cumulative = cumulative
                        .checked_add(mul_div_floor(entitled as u128, PRECISION, divisor as u128)?)
                        .ok_or(ErrorCode::MathOverflow)?;
                    snapshot = parent_cps;
                }
            }

            updates.push(NodeUpdate {
                node_id,
                cumulative_per_share: cumulative,
                parent_snapshot: snapshot,
            });
            parent_cps = cumulative;
        }

        Ok(PullPlan {
            version,
            updates,
            new_root_observed,
            leaf_cumulative_per_share: parent_cps,
        })
    }

    /// Commits a previously computed pull plan.
    pub fn apply_pull(&mut self, plan: &PullPlan) -> Result<()> {
        for update in &plan.updates {
            let entry = self
                .node_mut(update.node_id)?
                .version_entry_mut(plan.version)
                .ok_or(ErrorCode::VersionNotFound)?;
            entry.cumulative_per_share = update.cumulative_per_share;
            entry.parent_snapshot = update.parent_snapshot;
        }
        if let Some(observed) = plan.new_root_observed {
            let root = self
                .node_mut(ROOT_NODE_ID)?
                .version_entry_mut(plan.version)
                .ok_or(ErrorCode::VersionNotFound)?;
            root.last_observed_balance = observed;
        }
        Ok(())
    }

    /// Records that `amount` left the reward store, keeping the observed
    /// balance in sync so later pulls only see genuinely new funds.
    pub fn note_payout(&mut self, version: u16, amount: u64) -> Result<()> {
        let root = self
            .node_mut(ROOT_NODE_ID)?
            .version_entry_mut(version)
            .ok_or(ErrorCode::VersionNotFound)?;
        root.last_observed_balance = root
            .last_observed_balance
            .checked_sub(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    /// Applies a share delta to a leaf's total. Callers settle affected
    /// stakers first so existing entitlements are priced at the old total.
    pub fn adjust_leaf_shares(&mut self, leaf_id: u32, added: u64, removed: u64) -> Result<u64> {
        let node = self.node_mut(leaf_id)?;
        require!(node.kind == NodeKind::Leaf, ErrorCode::NotALeafNode);
        node.total_shares = node
            .total_shares
            .checked_add(added)
            .ok_or(ErrorCode::MathOverflow)?
            .checked_sub(removed)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(node.total_shares)
    }

    /// Pulls the live version's chain, pays the staker's pending reward and
    /// advances their snapshot. Returns `None` when the leaf has no live
    /// version with a bound store (nothing can have accrued yet). The
    /// returned amount still has to be transferred by the caller.
    pub fn settle_staker(
        &mut self,
        leaf_id: u32,
        record: &mut StakerRecord,
        store_balance: Option<u64>,
    ) -> Result<Option<SettlementOutcome>> {
        let Some(version) = self.leaf_active_version(leaf_id)? else {
            return Ok(None);
        };
        if self.root_store(version)?.is_none() {
            return Ok(None);
        }
        let balance = store_balance.ok_or(ErrorCode::RewardStoreRequired)?;
        let plan = self.compute_pull(leaf_id, version, balance)?;
        self.apply_pull(&plan)?;
        let snapshot = record.settlement_snapshot(version);
        let amount = pending_amount(record.shares, plan.leaf_cumulative_per_share, snapshot)?;
        record.set_settlement(version, plan.leaf_cumulative_per_share)?;
        if amount > 0 {
            self.note_payout(version, amount)?;
        }
        Ok(Some(SettlementOutcome { version, amount }))
    }

    /// Adds a collection to the admission whitelist. Idempotent; returns
    /// whether the entry is new.
    pub fn whitelist_collection(&mut self, collection: Pubkey) -> Result<bool> {
        if self.whitelisted_collections.contains(&collection) {
            return Ok(false);
        }
        require!(
            self.whitelisted_collections.len() < MAX_WHITELISTED_COLLECTIONS,
            ErrorCode::WhitelistFull
        );
        self.whitelisted_collections.push(collection);
        Ok(true)
    }

    pub fn is_whitelisted(&self, collection: &Pubkey) -> bool {
        self.whitelisted_collections.contains(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    const V1: u16 = 1;

    fn new_tree() -> DistributionTree {
        let mut tree = DistributionTree {
            admin: Pubkey::new_unique(),
            transfer_authority: Pubkey::new_unique(),
            reward_mint: Pubkey::new_unique(),
            unstake_lock_period: 0,
            nodes: Vec::new(),
            bound_stores: Vec::new(),
            whitelisted_collections: Vec::new(),
            authority_bump: 0,
            bump: 0,
        };
        tree.add_node(NodeKind::Routing).unwrap();
        tree
    }

    fn record(leaf_id: u32) -> StakerRecord {
        StakerRecord {
            tree: Pubkey::new_unique(),
            leaf_id,
            owner: Pubkey::new_unique(),
            shares: 0,
            settlements: Vec::new(),
            bump: 0,
        }
    }

    /// Root with two leaves at the given weights, version 1 activated.
    fn two_leaf_tree(weight_a: u64, weight_b: u64) -> (DistributionTree, u32, u32) {
        let mut tree = new_tree();
        let leaf_a = tree.add_node(NodeKind::Leaf).unwrap();
        let leaf_b = tree.add_node(NodeKind::Leaf).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, leaf_a, weight_a).unwrap();
        tree.bind_child(leaf_a, V1, ROOT_NODE_ID, 0).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, leaf_b, weight_b).unwrap();
        tree.bind_child(leaf_b, V1, ROOT_NODE_ID, 1).unwrap();
        tree.activate_root_version(V1, Pubkey::new_unique()).unwrap();
        (tree, leaf_a, leaf_b)
    }

    fn stake_shares(
        tree: &mut DistributionTree,
        leaf_id: u32,
        rec: &mut StakerRecord,
        amount: u64,
        store_balance: u64,
    ) -> u64 {
        let settled = tree
            .settle_staker(leaf_id, rec, Some(store_balance))
            .unwrap()
            .map(|outcome| outcome.amount)
            .unwrap_or(0);
        rec.shares += amount;
        tree.adjust_leaf_shares(leaf_id, amount, 0).unwrap();
        settled
    }

    fn unstake_shares(
        tree: &mut DistributionTree,
        leaf_id: u32,
        rec: &mut StakerRecord,
        amount: u64,
        store_balance: u64,
    ) -> u64 {
        let settled = tree
            .settle_staker(leaf_id, rec, Some(store_balance))
            .unwrap()
            .map(|outcome| outcome.amount)
            .unwrap_or(0);
        rec.shares -= amount;
        tree.adjust_leaf_shares(leaf_id, 0, amount).unwrap();
        settled
    }

    fn pending(tree: &DistributionTree, leaf_id: u32, rec: &StakerRecord, store_balance: u64) -> u64 {
        let plan = tree.compute_pull(leaf_id, V1, store_balance).unwrap();
        pending_amount(
            rec.shares,
            plan.leaf_cumulative_per_share,
            rec.settlement_snapshot(V1),
        )
        .unwrap()
    }

    fn claim(
        tree: &mut DistributionTree,
        leaf_id: u32,
        rec: &mut StakerRecord,
        store_balance: &mut u64,
    ) -> u64 {
        let plan = tree.compute_pull(leaf_id, V1, *store_balance).unwrap();
        tree.apply_pull(&plan).unwrap();
        let amount = pending_amount(
            rec.shares,
            plan.leaf_cumulative_per_share,
            rec.settlement_snapshot(V1),
        )
        .unwrap();
        rec.set_settlement(V1, plan.leaf_cumulative_per_share).unwrap();
        if amount > 0 {
            tree.note_payout(V1, amount).unwrap();
            *store_balance -= amount;
        }
        amount
    }

    #[test]
    fn mul_div_floor_rounds_down() {
        assert_eq!(mul_div_floor(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div_floor(10, 2, 3).unwrap(), 6);
        assert_eq!(mul_div_floor(u128::MAX, 1, 1).unwrap(), u128::MAX);
        assert!(mul_div_floor(u128::MAX, 2, 1).is_err());
        assert!(mul_div_floor(1, 1, 0).is_err());
    }

    #[test]
    fn rewards_split_by_user_and_parent_weights() {
        let (mut tree, leaf_a, leaf_b) = two_leaf_tree(2000, 8000);
        let mut user1 = record(leaf_a);
        let mut user2 = record(leaf_a);
        let mut user3 = record(leaf_b);
        stake_shares(&mut tree, leaf_a, &mut user1, 1000, 0);
        stake_shares(&mut tree, leaf_a, &mut user2, 3000, 0);
        stake_shares(&mut tree, leaf_b, &mut user3, 1000, 0);

        assert_eq!(pending(&tree, leaf_a, &user1, 0), 0);

        let balance = 10_000;
        assert_eq!(pending(&tree, leaf_a, &user1, balance), 500);
        assert_eq!(pending(&tree, leaf_a, &user2, balance), 1500);
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 8000);
    }

    #[test]
    fn new_staker_gets_nothing_from_earlier_injection() {
        let (mut tree, _leaf_a, leaf_b) = two_leaf_tree(2000, 8000);
        let mut user3 = record(leaf_b);
        stake_shares(&mut tree, leaf_b, &mut user3, 1000, 0);

        let balance = 10_000;
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 8000);

        let mut user1 = record(leaf_b);
        let paid = stake_shares(&mut tree, leaf_b, &mut user1, 1000, balance);
        assert_eq!(paid, 0);
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 0);
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 8000);

        let balance = 20_000;
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 4000);
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 12_000);
    }

    #[test]
    fn stake_reduction_settles_and_rebalances() {
        let (mut tree, _leaf_a, leaf_b) = two_leaf_tree(2000, 8000);
        let mut user3 = record(leaf_b);
        let mut user1 = record(leaf_b);
        stake_shares(&mut tree, leaf_b, &mut user3, 2000, 0);
        stake_shares(&mut tree, leaf_b, &mut user1, 2000, 0);

        let mut balance = 10_000;
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 4000);
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 4000);

        let paid = unstake_shares(&mut tree, leaf_b, &mut user1, 1000, balance);
        assert_eq!(paid, 4000);
        balance -= paid;
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 0);
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 4000);

        balance += 10_000;
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 8000 / 3);
        assert_eq!(pending(&tree, leaf_b, &user3, balance), 8000 * 2 / 3 + 4000);
    }

    #[test]
    fn simulation_matches_mutating_pull() {
        let (mut tree, _leaf_a, leaf_b) = two_leaf_tree(2000, 8000);
        let mut user3 = record(leaf_b);
        let mut user1 = record(leaf_b);
        stake_shares(&mut tree, leaf_b, &mut user3, 2000, 0);
        stake_shares(&mut tree, leaf_b, &mut user1, 1000, 0);

        let mut balance = 10_000;
        let simulated = pending(&tree, leaf_b, &user1, balance);
        let claimed = claim(&mut tree, leaf_b, &mut user1, &mut balance);
        assert_eq!(simulated, claimed);
        assert_eq!(claimed, 10_000 * 8000 / 10_000 / 3);

        // a second simulation after the commit sees no phantom funds
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 0);
        let simulated = pending(&tree, leaf_b, &user3, balance);
        let claimed = claim(&mut tree, leaf_b, &mut user3, &mut balance);
        assert_eq!(simulated, claimed);
    }

    #[test]
    fn zero_share_rewards_strand_until_shares_exist() {
        let (mut tree, _leaf_a, leaf_b) = two_leaf_tree(2000, 8000);

        // reward arrives while nobody holds shares in the leaf
        let balance = 10_000;
        let mut user1 = record(leaf_b);
        let paid = stake_shares(&mut tree, leaf_b, &mut user1, 1000, balance);
        assert_eq!(paid, 0);

        // the stranded amount folds in on the next pull after shares exist
        assert_eq!(pending(&tree, leaf_b, &user1, balance), 8000);
    }

    #[test]
    fn routing_activation_releases_retained_funds() {
        let mut tree = new_tree();
        let routing = tree.add_node(NodeKind::Routing).unwrap();
        let leaf_a = tree.add_node(NodeKind::Leaf).unwrap();
        let leaf_b = tree.add_node(NodeKind::Leaf).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, routing, 5000).unwrap();
        tree.bind_child(routing, V1, ROOT_NODE_ID, 0).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, leaf_a, 5000).unwrap();
        tree.bind_child(leaf_a, V1, ROOT_NODE_ID, 1).unwrap();
        tree.add_child(routing, V1, leaf_b, 10_000).unwrap();
        tree.bind_child(leaf_b, V1, routing, 0).unwrap();
        tree.activate_root_version(V1, Pubkey::new_unique()).unwrap();
        // the interior routing node is deliberately not activated yet

        let mut user_a = record(leaf_a);
        let mut user_b = record(leaf_b);
        stake_shares(&mut tree, leaf_a, &mut user_a, 1000, 0);
        stake_shares(&mut tree, leaf_b, &mut user_b, 1000, 0);

        let balance = 10_000;
        assert_eq!(pending(&tree, leaf_a, &user_a, balance), 5000);
        assert_eq!(pending(&tree, leaf_b, &user_b, balance), 0);

        tree.activate_routing_version(routing, V1).unwrap();
        assert_eq!(pending(&tree, leaf_b, &user_b, balance), 5000);
    }

    // Root ─┬─ leaf1 (2000)
    //       ├─ routing1 (3000) ── leaf2 (10000)
    //       └─ routing2 (5000) ─┬─ leaf3 (1000)
    //                           ├─ leaf4 (5000)
    //                           └─ routing3 (4000) ─┬─ leaf5 (7000)
    //                                               └─ leaf6 (3000)
    #[test]
    fn multilevel_distribution_regression() {
        let mut tree = new_tree();
        let leaf1 = tree.add_node(NodeKind::Leaf).unwrap();
        let routing1 = tree.add_node(NodeKind::Routing).unwrap();
        let routing2 = tree.add_node(NodeKind::Routing).unwrap();
        let leaf2 = tree.add_node(NodeKind::Leaf).unwrap();
        let leaf3 = tree.add_node(NodeKind::Leaf).unwrap();
        let leaf4 = tree.add_node(NodeKind::Leaf).unwrap();
        let routing3 = tree.add_node(NodeKind::Routing).unwrap();
        let leaf5 = tree.add_node(NodeKind::Leaf).unwrap();
        let leaf6 = tree.add_node(NodeKind::Leaf).unwrap();

        tree.add_child(ROOT_NODE_ID, V1, leaf1, 2000).unwrap();
        tree.bind_child(leaf1, V1, ROOT_NODE_ID, 0).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, routing1, 3000).unwrap();
        tree.bind_child(routing1, V1, ROOT_NODE_ID, 1).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, routing2, 5000).unwrap();
        tree.bind_child(routing2, V1, ROOT_NODE_ID, 2).unwrap();

        tree.add_child(routing1, V1, leaf2, 10_000).unwrap();
        tree.bind_child(leaf2, V1, routing1, 0).unwrap();

        tree.add_child(routing2, V1, leaf3, 1000).unwrap();
        tree.bind_child(leaf3, V1, routing2, 0).unwrap();
        tree.add_child(routing2, V1, leaf4, 5000).unwrap();
        tree.bind_child(leaf4, V1, routing2, 1).unwrap();
        tree.add_child(routing2, V1, routing3, 4000).unwrap();
        tree.bind_child(routing3, V1, routing2, 2).unwrap();

        tree.add_child(routing3, V1, leaf5, 7000).unwrap();
        tree.bind_child(leaf5, V1, routing3, 0).unwrap();
        tree.add_child(routing3, V1, leaf6, 3000).unwrap();
        tree.bind_child(leaf6, V1, routing3, 1).unwrap();

        tree.activate_routing_version(routing3, V1).unwrap();
        tree.activate_routing_version(routing2, V1).unwrap();
        tree.activate_routing_version(routing1, V1).unwrap();
        tree.activate_root_version(V1, Pubkey::new_unique()).unwrap();

        let leaves = [leaf1, leaf2, leaf3, leaf4, leaf5, leaf6];
        let mut users: Vec<Vec<StakerRecord>> = Vec::new();
        for &leaf_id in &leaves {
            let mut per_leaf = Vec::new();
            for shares in [2000u64, 3000, 5000] {
                let mut rec = record(leaf_id);
                stake_shares(&mut tree, leaf_id, &mut rec, shares, 0);
                per_leaf.push(rec);
            }
            users.push(per_leaf);
        }

        let mut balance = 10_000;
        let leaf_totals = [2000u64, 3000, 500, 2500, 1400, 600];
        for (i, &leaf_id) in leaves.iter().enumerate() {
            assert_eq!(pending(&tree, leaf_id, &users[i][0], balance), leaf_totals[i] * 2 / 10);
            assert_eq!(pending(&tree, leaf_id, &users[i][1], balance), leaf_totals[i] * 3 / 10);
            assert_eq!(pending(&tree, leaf_id, &users[i][2], balance), leaf_totals[i] * 5 / 10);
        }

        // first user claims everywhere; nothing owed to the others moves
        let mut user1_total = 0;
        for (i, &leaf_id) in leaves.iter().enumerate() {
            let rec = &mut users[i][0];
            user1_total += claim(&mut tree, leaf_id, rec, &mut balance);
        }
        assert_eq!(user1_total, leaf_totals.iter().map(|t| t * 2 / 10).sum::<u64>());
        for (i, &leaf_id) in leaves.iter().enumerate() {
            assert_eq!(pending(&tree, leaf_id, &users[i][0], balance), 0);
            assert_eq!(pending(&tree, leaf_id, &users[i][1], balance), leaf_totals[i] * 3 / 10);
            assert_eq!(pending(&tree, leaf_id, &users[i][2], balance), leaf_totals[i] * 5 / 10);
        }

        // second injection doubles what the others are owed
        balance += 10_000;
        for (i, &leaf_id) in leaves.iter().enumerate() {
            assert_eq!(pending(&tree, leaf_id, &users[i][0], balance), leaf_totals[i] * 2 / 10);
            assert_eq!(pending(&tree, leaf_id, &users[i][1], balance), leaf_totals[i] * 3 / 10 * 2);
            assert_eq!(pending(&tree, leaf_id, &users[i][2], balance), leaf_totals[i] * 5 / 10 * 2);
        }

        // everyone claims everything; the store drains completely
        for user_index in 0..3 {
            for (i, &leaf_id) in leaves.iter().enumerate() {
                claim(&mut tree, leaf_id, &mut users[i][user_index], &mut balance);
            }
        }
        assert_eq!(balance, 0);
        for (i, &leaf_id) in leaves.iter().enumerate() {
            for rec in &users[i] {
                assert_eq!(pending(&tree, leaf_id, rec, balance), 0);
            }
        }
    }

    #[test]
    fn transfer_settles_and_moves_shares() {
        let (mut tree, leaf_a, _leaf_b) = two_leaf_tree(2000, 8000);
        let mut from = record(leaf_a);
        stake_shares(&mut tree, leaf_a, &mut from, 1000, 0);

        let mut balance = 10_000;
        assert_eq!(pending(&tree, leaf_a, &from, balance), 2000);

        // settle the outgoing owner, then hand the shares to the recipient
        // with a fresh snapshot so they start at zero pending
        let paid = tree
            .settle_staker(leaf_a, &mut from, Some(balance))
            .unwrap()
            .map(|outcome| outcome.amount)
            .unwrap_or(0);
        assert_eq!(paid, 2000);
        balance -= paid;
        let mut to = record(leaf_a);
        to.shares = from.shares;
        from.shares = 0;
        let snapshot = from.settlement_snapshot(V1);
        to.set_settlement(V1, snapshot).unwrap();

        assert_eq!(pending(&tree, leaf_a, &from, balance), 0);
        assert_eq!(pending(&tree, leaf_a, &to, balance), 0);

        balance += 10_000;
        assert_eq!(pending(&tree, leaf_a, &from, balance), 0);
        assert_eq!(pending(&tree, leaf_a, &to, balance), 2000);
    }

    #[test]
    fn source_binding_is_exactly_once() {
        let (mut tree, leaf_a, leaf_b) = two_leaf_tree(2000, 8000);
        let first_store = tree.root_store(V1).unwrap().unwrap();

        const V2: u16 = 2;
        tree.add_child(ROOT_NODE_ID, V2, leaf_a, 8000).unwrap();
        tree.bind_child(leaf_a, V2, ROOT_NODE_ID, 0).unwrap();
        tree.add_child(ROOT_NODE_ID, V2, leaf_b, 2000).unwrap();
        tree.bind_child(leaf_b, V2, ROOT_NODE_ID, 1).unwrap();

        let err = tree.activate_root_version(V2, first_store).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::RewardSourceAlreadyBound));
        assert_eq!(tree.root_store(V1).unwrap(), Some(first_store));

        tree.activate_root_version(V2, Pubkey::new_unique()).unwrap();
        assert_eq!(tree.root_store(V1).unwrap(), Some(first_store));
    }

    #[test]
    fn version_lifecycle_guards() {
        let mut tree = new_tree();
        let leaf_a = tree.add_node(NodeKind::Leaf).unwrap();
        let leaf_b = tree.add_node(NodeKind::Leaf).unwrap();
        tree.add_child(ROOT_NODE_ID, V1, leaf_a, 1000).unwrap();
        tree.bind_child(leaf_a, V1, ROOT_NODE_ID, 0).unwrap();

        // duplicate child in one version
        let err = tree.add_child(ROOT_NODE_ID, V1, leaf_a, 500).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::DuplicateChild));

        // double bind of the same (child, version)
        tree.add_child(ROOT_NODE_ID, V1, leaf_b, 500).unwrap();
        tree.bind_child(leaf_b, V1, ROOT_NODE_ID, 1).unwrap();
        let err = tree.bind_child(leaf_b, V1, ROOT_NODE_ID, 1).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::ChildAlreadyBound));

        // structural changes are rejected once active
        tree.activate_root_version(V1, Pubkey::new_unique()).unwrap();
        let err = tree.add_child(ROOT_NODE_ID, V1, leaf_b, 500).unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::VersionNotConfiguring));
        let err = tree
            .activate_root_version(V1, Pubkey::new_unique())
            .unwrap_err();
        assert_eq!(err, Error::from(ErrorCode::VersionNotConfiguring));
    }

    #[test]
    fn truncation_dust_stays_where_it_fell() {
        let (mut tree, leaf_a, leaf_b) = two_leaf_tree(3333, 6667);
        let mut user_a = record(leaf_a);
        let mut user_b = record(leaf_b);
        stake_shares(&mut tree, leaf_a, &mut user_a, 1000, 0);
        stake_shares(&mut tree, leaf_b, &mut user_b, 1000, 0);

        let balance = 10;
        let a = pending(&tree, leaf_a, &user_a, balance);
        let b = pending(&tree, leaf_b, &user_b, balance);
        assert_eq!(a, 3);
        assert_eq!(b, 6);
        // one unit is stranded by floor division and never redistributed
        assert!(a + b < balance);
    }
}
