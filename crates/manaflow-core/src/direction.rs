//! Routing directions for flows.
//!
//! A [`DirectionMask`] is a set over the four grid neighbours plus
//! `DISPERSE`, which routes to the global pool. Grid orientation: `LEFT` is
//! `x - 1`, `RIGHT` is `x + 1`, `UP` is `y + 1` and `DOWN` is `y - 1`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Bit set of routing targets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DirectionMask: u8 {
        const LEFT = 1;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;
        const DISPERSE = 1 << 4;
    }
}

impl Default for DirectionMask {
    fn default() -> Self {
        Self::empty()
    }
}

impl DirectionMask {
    /// Rotate the cardinal bits by `times` quarter turns
    /// (LEFT -> UP -> RIGHT -> DOWN -> LEFT). DISPERSE is unaffected.
    pub fn rotated(self, times: u32) -> Self {
        let mut out = self & Self::DISPERSE;
        for side in self.sides() {
            out |= side.rotated(times).mask();
        }
        out
    }

    /// Swap LEFT with RIGHT and UP with DOWN. DISPERSE is unaffected.
    pub fn flipped(self) -> Self {
        let mut out = self & Self::DISPERSE;
        for side in self.sides() {
            out |= side.opposite().mask();
        }
        out
    }

    /// Number of active routing targets, DISPERSE included.
    pub fn active_count(self) -> u32 {
        self.bits().count_ones()
    }

    /// Cardinal sides present in the mask, in LEFT, RIGHT, UP, DOWN order.
    pub fn sides(self) -> impl Iterator<Item = Side> {
        Side::ALL
            .into_iter()
            .filter(move |side| self.contains(side.mask()))
    }

    pub fn disperses(self) -> bool {
        self.contains(Self::DISPERSE)
    }
}

impl fmt::Display for DirectionMask {
    /// Five fixed columns, `L R U D O`, with `_` for absent bits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = [
            (Self::LEFT, 'L'),
            (Self::RIGHT, 'R'),
            (Self::UP, 'U'),
            (Self::DOWN, 'D'),
            (Self::DISPERSE, 'O'),
        ];
        for (flag, c) in columns {
            let c = if self.contains(flag) { c } else { '_' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// One of the four grid neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Up,
    Down,
}

impl Side {
    /// All sides, in mask bit order.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Up, Side::Down];

    /// Quarter-turn cycle used by rotation.
    const CYCLE: [Side; 4] = [Side::Left, Side::Up, Side::Right, Side::Down];

    pub fn mask(self) -> DirectionMask {
        match self {
            Side::Left => DirectionMask::LEFT,
            Side::Right => DirectionMask::RIGHT,
            Side::Up => DirectionMask::UP,
            Side::Down => DirectionMask::DOWN,
        }
    }

    /// The side a neighbour receives from when this side sends to it.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Up => Side::Down,
            Side::Down => Side::Up,
        }
    }

    /// Grid offset `(dx, dy)` towards the neighbour on this side.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
            Side::Up => (0, 1),
            Side::Down => (0, -1),
        }
    }

    pub fn rotated(self, times: u32) -> Side {
        let index = match self {
            Side::Left => 0,
            Side::Up => 1,
            Side::Right => 2,
            Side::Down => 3,
        };
        Self::CYCLE[(index + (times % 4) as usize) % 4]
    }
}
