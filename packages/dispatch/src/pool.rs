//! Unordered pool of filler payloads handed out while workers are idle.

use std::sync::{PoisonError, RwLock};

use crate::random::Randomness;

/// Payloads a flexible worker may distribute when no queue has work.
///
/// Drawing never removes an entry; the same payload can come up again.
pub struct DistributionPool<P> {
    entries: RwLock<Vec<P>>,
}

impl<P> DistributionPool<P> {
    /// Create a new empty pool.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, payload: P) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload);
    }

    pub fn extend(&self, payloads: impl IntoIterator<Item = P>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(payloads);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<P: Clone> DistributionPool<P> {
    /// Copy out one entry chosen uniformly at random.
    pub fn random(&self, rng: &dyn Randomness) -> Option<P> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        if entries.is_empty() {
            return None;
        }
        entries.get(rng.index(entries.len())).cloned()
    }
}

impl<P> Default for DistributionPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> FromIterator<P> for DistributionPool<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            entries: RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandomness;

    #[test]
    fn draw_leaves_pool_intact() {
        let pool: DistributionPool<u16> = [25, 133, 150].into_iter().collect();
        let rng = SeededRandomness::new(7);

        for _ in 0..20 {
            let drawn = pool.random(&rng).expect("pool is not empty");
            assert!([25, 133, 150].contains(&drawn));
        }
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn empty_pool_draws_nothing() {
        let pool: DistributionPool<u16> = DistributionPool::new();
        assert!(pool.random(&SeededRandomness::new(1)).is_none());
        pool.add(1);
        pool.clear();
        assert!(pool.is_empty());
    }
}
