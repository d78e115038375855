//! Rate limiting per `(kind, target)`.

use core_effects::CooldownKey;
use std::collections::BTreeMap;

/// Earliest tick at which each key may spawn again. Ordered so pruning and
/// iteration are deterministic.
#[derive(Debug, Clone, Default)]
pub struct CooldownTable {
    next_allowed: BTreeMap<CooldownKey, u64>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok` when `key` may spawn at `tick`, otherwise the tick it becomes ready.
    pub fn ready(&self, key: &CooldownKey, tick: u64) -> Result<(), u64> {
        match self.next_allowed.get(key) {
            Some(&at) if at > tick => Err(at),
            _ => Ok(()),
        }
    }

    /// Block `key` until `until`. Never shortens an existing window.
    pub fn arm(&mut self, key: CooldownKey, until: u64) {
        let slot = self.next_allowed.entry(key).or_insert(until);
        if *slot < until {
            *slot = until;
        }
    }

    /// Drop entries that no longer block anything at `tick`. Returns how many were removed.
    pub fn prune(&mut self, tick: u64) -> usize {
        let before = self.next_allowed.len();
        self.next_allowed.retain(|_, at| *at > tick);
        before - self.next_allowed.len()
    }

    pub fn len(&self) -> usize {
        self.next_allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_allowed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CooldownKey, &u64)> {
        self.next_allowed.iter()
    }
}
