//! Bounded top-K ranking heaps keyed by symbol
//!
//! A `BoundedRankingHeap` retains at most `capacity` entries, one per symbol,
//! holding the most extreme values seen so far. The polarity decides what
//! "extreme" means:
//!
//! - `Polarity::Max` keeps the largest values (top gainers)
//! - `Polarity::Min` keeps the smallest values (top losers)
//!
//! Internally the entries live in an array-backed binary heap ordered by a
//! rank key (`value` for Min, `-value` for Max). The root is always the
//! *least* extreme retained entry, so a full heap can decide in O(1) whether
//! a new symbol displaces anything.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Polarity {
    /// Retains the smallest values
    Min,
    /// Retains the largest values
    Max,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Min => "min",
            Polarity::Max => "max",
        }
    }

    /// Map a value onto the ascending rank axis (smaller key = more extreme).
    /// Adding 0.0 folds -0.0 into 0.0 so zero changes tie-break on symbol.
    fn rank_key(&self, value: f64) -> f64 {
        let key = match self {
            Polarity::Min => value,
            Polarity::Max => -value,
        };
        key + 0.0
    }

    fn value_from_key(&self, key: f64) -> f64 {
        match self {
            Polarity::Min => key,
            Polarity::Max => -key + 0.0,
        }
    }
}

/// How heap order is restored after an in-place replacement or removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreStrategy {
    /// Re-heapify the whole array (reference behaviour)
    #[default]
    Rebuild,
    /// Sift only the touched position up or down
    Sift,
}

/// A ranked (symbol, value, timestamp) triple as returned by `get_top`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub symbol: String,
    pub value: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
struct Slot {
    key: f64,
    symbol: String,
    timestamp: i64,
}

impl Slot {
    /// Whole-tuple comparison: rank key, then symbol, then timestamp
    fn rank_cmp(&self, other: &Slot) -> Ordering {
        self.key
            .total_cmp(&other.key)
            .then_with(|| self.symbol.cmp(&other.symbol))
            .then_with(|| self.timestamp.cmp(&other.timestamp))
    }
}

#[derive(Debug, Clone)]
pub struct BoundedRankingHeap {
    polarity: Polarity,
    capacity: usize,
    strategy: RestoreStrategy,
    /// Heap array; slots[0] is the least extreme retained entry
    slots: Vec<Slot>,
    /// symbol -> position in `slots`, rebuilt after every structural change
    index: HashMap<String, usize>,
}

impl BoundedRankingHeap {
    /// # Panics
    /// Panics if capacity is 0.
    pub fn new(polarity: Polarity, capacity: usize) -> Self {
        Self::with_strategy(polarity, capacity, RestoreStrategy::default())
    }

    pub fn with_strategy(polarity: Polarity, capacity: usize, strategy: RestoreStrategy) -> Self {
        assert!(capacity > 0, "BoundedRankingHeap capacity must be > 0");
        Self {
            polarity,
            capacity,
            strategy,
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Max-polarity heap (top gainers)
    pub fn max(capacity: usize) -> Self {
        Self::new(Polarity::Max, capacity)
    }

    /// Min-polarity heap (top losers)
    pub fn min(capacity: usize) -> Self {
        Self::new(Polarity::Min, capacity)
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn strategy(&self) -> RestoreStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    /// Current entry for a tracked symbol
    pub fn entry(&self, symbol: &str) -> Option<RankedEntry> {
        self.index.get(symbol).map(|&pos| self.to_entry(&self.slots[pos]))
    }

    /// Upsert `symbol` with a new value.
    ///
    /// - Tracked symbol: replaced in place, heap order restored.
    /// - New symbol with spare capacity: inserted.
    /// - New symbol while full: evicts the least extreme entry only if the
    ///   new value is strictly more extreme, otherwise ignored.
    ///
    /// - Non-finite value: ignored.
    ///
    /// Returns whether the heap changed.
    pub fn push(&mut self, symbol: &str, value: f64, timestamp: i64) -> bool {
        if !value.is_finite() {
            log::debug!(
                "{} heap ignoring non-finite value {} for {}",
                self.polarity.as_str(),
                value,
                symbol
            );
            return false;
        }

        let slot = Slot {
            key: self.polarity.rank_key(value),
            symbol: symbol.to_string(),
            timestamp,
        };

        if let Some(&pos) = self.index.get(symbol) {
            self.slots[pos] = slot;
            self.restore(pos);
        } else if self.slots.len() < self.capacity {
            self.slots.push(slot);
            let last = self.slots.len() - 1;
            self.sift_up(last);
        } else if slot.key < self.slots[0].key {
            log::debug!(
                "{} heap evicting {} for {}",
                self.polarity.as_str(),
                self.slots[0].symbol,
                symbol
            );
            self.slots[0] = slot;
            self.sift_down(0);
        } else {
            return false;
        }

        self.rebuild_index();
        true
    }

    /// Up to `n` entries (default: capacity), most extreme first
    pub fn get_top(&self, n: Option<usize>) -> Vec<RankedEntry> {
        let n = n.unwrap_or(self.capacity);
        let mut ordered: Vec<&Slot> = self.slots.iter().collect();
        ordered.sort_by(|a, b| a.rank_cmp(b));

        ordered
            .into_iter()
            .take(n)
            .map(|slot| self.to_entry(slot))
            .collect()
    }

    /// Remove `symbol` if tracked; the last slot is moved into the hole
    pub fn remove(&mut self, symbol: &str) -> bool {
        let pos = match self.index.remove(symbol) {
            Some(pos) => pos,
            None => return false,
        };

        self.slots.swap_remove(pos);
        if pos < self.slots.len() {
            self.restore(pos);
        }

        self.rebuild_index();
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    fn to_entry(&self, slot: &Slot) -> RankedEntry {
        RankedEntry {
            symbol: slot.symbol.clone(),
            value: self.polarity.value_from_key(slot.key),
            timestamp: slot.timestamp,
        }
    }

    fn restore(&mut self, pos: usize) {
        match self.strategy {
            RestoreStrategy::Rebuild => self.heapify(),
            RestoreStrategy::Sift => {
                if pos > 0 && self.outranks(pos, (pos - 1) / 2) {
                    self.sift_up(pos);
                } else {
                    self.sift_down(pos);
                }
            }
        }
    }

    /// True when slots[a] belongs closer to the root than slots[b]
    fn outranks(&self, a: usize, b: usize) -> bool {
        self.slots[a].rank_cmp(&self.slots[b]) == Ordering::Greater
    }

    fn heapify(&mut self) {
        for pos in (0..self.slots.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.outranks(pos, parent) {
                break;
            }
            self.slots.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut top = pos;

            if left < len && self.outranks(left, top) {
                top = left;
            }
            if right < len && self.outranks(right, top) {
                top = right;
            }
            if top == pos {
                break;
            }
            self.slots.swap(pos, top);
            pos = top;
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, slot) in self.slots.iter().enumerate() {
            self.index.insert(slot.symbol.clone(), pos);
        }
    }

    /// Heap order and index agree with the slot array
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let ordered = (1..self.slots.len()).all(|pos| !self.outranks(pos, (pos - 1) / 2));
        let indexed = self.index.len() == self.slots.len()
            && self
                .index
                .iter()
                .all(|(symbol, &pos)| self.slots.get(pos).map(|s| &s.symbol) == Some(symbol));
        ordered && indexed && self.slots.len() <= self.capacity
    }
}
