//! Collections indexed by relative bunch crossing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::Error;

/// Objects grouped by bunch-crossing offset relative to the triggering crossing.
///
/// Offsets are contiguous: `bunches[i]` holds the objects read out at offset
/// `first_bx + i`. An empty `bunches` list is an empty range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "BxVectorRepr<T>")]
pub struct BxVector<T> {
    first_bx: i32,
    bunches: Vec<Vec<T>>,
}

/// Wire form of [`BxVector`]; `bunches` may be omitted.
#[derive(Deserialize, JsonSchema)]
struct BxVectorRepr<T> {
    first_bx: i32,
    bunches: Option<Vec<Vec<T>>>,
}

impl<T> TryFrom<BxVectorRepr<T>> for BxVector<T> {
    type Error = Error;

    fn try_from(repr: BxVectorRepr<T>) -> Result<Self, Self::Error> {
        let bunches = repr.bunches.unwrap_or_default();
        let last = i64::from(repr.first_bx) + bunches.len() as i64 - 1;
        if !bunches.is_empty() && last > i64::from(i32::MAX) {
            return Err(Error::InvalidEvent(format!(
                "bunch crossings {}..{} exceed the offset range",
                repr.first_bx,
                last
            )));
        }
        Ok(BxVector {
            first_bx: repr.first_bx,
            bunches,
        })
    }
}

impl<T> Default for BxVector<T> {
    fn default() -> Self {
        BxVector {
            first_bx: 0,
            bunches: Vec::new(),
        }
    }
}

impl<T> BxVector<T> {
    /// Create an empty vector covering `first_bx..=last_bx`.
    pub fn with_range(first_bx: i32, last_bx: i32) -> Self {
        let len = if last_bx >= first_bx {
            (i64::from(last_bx) - i64::from(first_bx) + 1) as usize
        } else {
            0
        };
        let mut bunches = Vec::with_capacity(len);
        bunches.resize_with(len, Vec::new);
        BxVector { first_bx, bunches }
    }

    /// Build from per-crossing lists starting at `first_bx`.
    pub fn from_bunches(first_bx: i32, bunches: Vec<Vec<T>>) -> Self {
        BxVector { first_bx, bunches }
    }

    pub fn first_bx(&self) -> i32 {
        self.first_bx
    }

    /// Last populated offset; `first_bx - 1` when the range is empty.
    ///
    /// Saturates at the `i32` bounds.
    pub fn last_bx(&self) -> i32 {
        let last = i64::from(self.first_bx) + self.bunches.len() as i64 - 1;
        last.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// All offsets covered by this vector.
    #[allow(clippy::reversed_empty_ranges)]
    pub fn bx_range(&self) -> RangeInclusive<i32> {
        if self.bunches.is_empty() {
            return 1..=0;
        }
        self.first_bx()..=self.last_bx()
    }

    /// Objects at one offset; empty for offsets outside the range.
    pub fn at(&self, bx: i32) -> &[T] {
        match self.slot(bx) {
            Some(idx) => &self.bunches[idx],
            None => &[],
        }
    }

    /// Append an object at `bx`, extending the range if needed.
    pub fn push(&mut self, bx: i32, item: T) {
        if self.bunches.is_empty() {
            self.first_bx = bx;
        }
        if bx < self.first_bx {
            let grow = (i64::from(self.first_bx) - i64::from(bx)) as usize;
            let mut front: Vec<Vec<T>> = Vec::with_capacity(grow + self.bunches.len());
            front.resize_with(grow, Vec::new);
            front.append(&mut self.bunches);
            self.bunches = front;
            self.first_bx = bx;
        }
        let idx = (i64::from(bx) - i64::from(self.first_bx)) as usize;
        if idx >= self.bunches.len() {
            self.bunches.resize_with(idx + 1, Vec::new);
        }
        self.bunches[idx].push(item);
    }

    /// Total number of objects over all offsets.
    pub fn size(&self) -> usize {
        self.bunches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Iterate `(offset, objects)` pairs in increasing offset order.
    ///
    /// Crossings past `i32::MAX` are not visited.
    pub fn iter_bunches(&self) -> impl Iterator<Item = (i32, &[T])> {
        self.bx_range()
            .zip(self.bunches.iter())
            .map(|(bx, b)| (bx, b.as_slice()))
    }

    fn slot(&self, bx: i32) -> Option<usize> {
        if bx < self.first_bx {
            return None;
        }
        let idx = (i64::from(bx) - i64::from(self.first_bx)) as usize;
        (idx < self.bunches.len()).then_some(idx)
    }
}
