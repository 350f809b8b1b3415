//! Signed-exponent multiset used for dimensions and concrete display units.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A multiset whose multiplicities are signed integer exponents.
///
/// Entries with exponent 0 are never stored, so derived equality compares
/// only the materially present entries. Every operation returns a new bag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    bound(
        serialize = "T: Ord + Serialize",
        deserialize = "T: Ord + Deserialize<'de>"
    ),
    from = "StoredBag<T>"
)]
pub struct Bag<T: Ord> {
    entries: BTreeMap<T, i32>,
}

/// Serialized form, which may carry zero exponents
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Ord + Deserialize<'de>"))]
struct StoredBag<T: Ord> {
    entries: BTreeMap<T, i32>,
}

impl<T: Ord> From<StoredBag<T>> for Bag<T> {
    fn from(stored: StoredBag<T>) -> Self {
        let mut entries = stored.entries;
        entries.retain(|_, power| *power != 0);
        Self { entries }
    }
}

impl<T: Ord> Default for Bag<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Ord + Copy> Bag<T> {
    /// The empty bag (dimensionless / no units)
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag holding a single entry with exponent 1
    pub fn single(item: T) -> Self {
        Self::new().added(item, 1)
    }

    /// Build a bag from `(item, exponent)` pairs, summing repeated items
    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, i32)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::new(), |bag, (item, power)| bag.added(item, power))
    }

    /// Return a copy with `power` added to the exponent of `item`
    pub fn added(&self, item: T, power: i32) -> Self {
        let mut entries = self.entries.clone();
        let exponent = entries.entry(item).or_insert(0);
        *exponent += power;
        if *exponent == 0 {
            entries.remove(&item);
        }
        Self { entries }
    }

    /// Exponent of `item` (0 when absent)
    pub fn exponent(&self, item: &T) -> i32 {
        self.entries.get(item).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(item, exponent)` pairs in item order
    pub fn iter(&self) -> impl Iterator<Item = (T, i32)> + '_ {
        self.entries.iter().map(|(item, power)| (*item, *power))
    }

    /// Entry-wise union adding exponents
    pub fn multiply(&self, other: &Self) -> Self {
        other
            .iter()
            .fold(self.clone(), |bag, (item, power)| bag.added(item, power))
    }

    /// Entry-wise union subtracting the other bag's exponents
    pub fn divide(&self, other: &Self) -> Self {
        other
            .iter()
            .fold(self.clone(), |bag, (item, power)| bag.added(item, -power))
    }

    /// Multiply every exponent by an integer
    pub fn scale(&self, power: i32) -> Self {
        Self::from_pairs(self.iter().map(|(item, exponent)| (item, exponent * power)))
    }

    /// Raise the bag to a real power.
    ///
    /// Returns `None` when any resulting exponent is not integral, e.g. the
    /// square root of a single length.
    pub fn powf(&self, power: f64) -> Option<Self> {
        let mut pairs = Vec::with_capacity(self.len());
        for (item, exponent) in self.iter() {
            let scaled = exponent as f64 * power;
            let rounded = scaled.round();
            if (scaled - rounded).abs() > 1e-9 {
                return None;
            }
            pairs.push((item, rounded as i32));
        }
        Some(Self::from_pairs(pairs))
    }

    /// Bag with every exponent negated
    pub fn inverse(&self) -> Self {
        self.scale(-1)
    }
}

impl<T: Ord + Copy> FromIterator<(T, i32)> for Bag<T> {
    fn from_iter<I: IntoIterator<Item = (T, i32)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
