use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed production node. Stale after the node is removed.
    pub struct NodeId;
}

