//! Sparse position index over an unbounded integer grid.
//!
//! Storage is two-level (column `x`, then row `y`) using ordered maps so that
//! iteration and rectangle queries are deterministic.

use crate::direction::Side;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cell on the grid. Coordinates are arbitrary signed integers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell on `side`.
    pub fn neighbor(&self, side: Side) -> Self {
        let (dx, dy) = side.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Coordinate-keyed storage holding at most one value per cell.
#[derive(Debug, Clone)]
pub struct SparseGrid<T> {
    columns: BTreeMap<i32, BTreeMap<i32, T>>,
    len: usize,
}

impl<T> Default for SparseGrid<T> {
    fn default() -> Self {
        Self {
            columns: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<T> SparseGrid<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: GridPosition) -> Option<&T> {
        self.columns.get(&pos.x)?.get(&pos.y)
    }

    pub fn get_mut(&mut self, pos: GridPosition) -> Option<&mut T> {
        self.columns.get_mut(&pos.x)?.get_mut(&pos.y)
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        self.get(pos).is_some()
    }

    /// Store `value` at `pos`, overwriting. Returns the previous value.
    pub fn set(&mut self, pos: GridPosition, value: T) -> Option<T> {
        let previous = self.columns.entry(pos.x).or_default().insert(pos.y, value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Store `value` only if the cell is empty. Returns false (and leaves the
    /// grid untouched) when the cell is occupied.
    pub fn add(&mut self, pos: GridPosition, value: T) -> bool {
        if self.contains(pos) {
            return false;
        }
        self.set(pos, value);
        true
    }

    /// Remove and return the value at `pos`.
    pub fn take(&mut self, pos: GridPosition) -> Option<T> {
        let column = self.columns.get_mut(&pos.x)?;
        let value = column.remove(&pos.y)?;
        if column.is_empty() {
            self.columns.remove(&pos.x);
        }
        self.len -= 1;
        Some(value)
    }

    /// Remove the value at `pos`. Returns true if something was removed.
    pub fn remove(&mut self, pos: GridPosition) -> bool {
        self.take(pos).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All occupied cells, ordered by `x` then `y`.
    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, &T)> {
        self.columns.iter().flat_map(|(&x, column)| {
            column
                .iter()
                .map(move |(&y, value)| (GridPosition::new(x, y), value))
        })
    }

    /// Occupied cells inside the inclusive rectangle `min..=max`, ordered by
    /// `x` then `y`. An inverted rectangle yields nothing.
    pub fn in_rect(
        &self,
        min: GridPosition,
        max: GridPosition,
    ) -> impl Iterator<Item = (GridPosition, &T)> {
        let columns = if min.x <= max.x && min.y <= max.y {
            Some(self.columns.range(min.x..=max.x))
        } else {
            None
        };
        columns.into_iter().flatten().flat_map(move |(&x, column)| {
            column
                .range(min.y..=max.y)
                .map(move |(&y, value)| (GridPosition::new(x, y), value))
        })
    }
}
