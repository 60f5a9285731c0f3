//! The global resource pool: everything routed with `DISPERSE`.

use crate::flow::FlowUnit;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resources available to the whole system. One entry per item; merging
/// adds quantities and never replaces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalPool {
    entries: Vec<FlowUnit>,
}

impl GlobalPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `unit.queued` to the entry for `unit.item`, inserting a copy of
    /// the unit if the item is new.
    pub fn merge(&mut self, unit: &FlowUnit) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item == unit.item) {
            entry.queued += unit.queued;
            return;
        }
        self.entries.push(unit.clone());
    }

    /// Amount held for `item` (zero if never seen).
    pub fn amount(&self, item: &ItemId) -> f64 {
        self.entries
            .iter()
            .find(|e| &e.item == item)
            .map(|e| e.queued)
            .unwrap_or(0.0)
    }

    /// Read-only snapshot of totals per item.
    pub fn summary(&self) -> BTreeMap<ItemId, f64> {
        self.entries
            .iter()
            .map(|e| (e.item.clone(), e.queued))
            .collect()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &FlowUnit> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
