//! Growable address-indexed metadata table.
//!
//! Every simulator keeps some per-address state (membership flag, slot
//! position, aging counter, timestamps). `AddressTable` is the one place that
//! state lives, so growth rules are not duplicated per policy.
//!
//! ## Architecture
//!
//! ```text
//!   Dense (small, contiguous universes)        Sparse (large / scattered)
//!   ┌───┬───┬───┬───┬───┬───┬───┬───┐          FxHashMap<u64, T>
//!   │ 0 │ 1 │ 2 │ 3 │ 4 │ 5 │...│n-1│          ┌──────────┬───────┐
//!   └───┴───┴───┴───┴───┴───┴───┴───┘          │ 12000017 │ meta  │
//!     addr >= n  →  grow to max(addr*3/2+1, addr+1)  │ 98       │ meta  │
//!                                              └──────────┴───────┘
//!
//!   Auto: starts Dense; once an address exceeds `dense_limit`, every
//!   non-default entry is moved into a Sparse map and the table stays sparse.
//!   Dense: same, but the bound is `DENSE_CEILING`, the largest array the
//!   table will ever allocate.
//! ```
//!
//! ## Behavior
//! - Reads of never-seen addresses return `T::default()` and allocate nothing.
//! - `get_mut` creates the entry lazily, growing the backing if required.
//! - Growth never shrinks and never drops entries.
//!
//! ## Performance
//! - Dense `get` / `get_mut`: O(1), amortized O(1) on growth
//! - Sparse `get` / `get_mut`: O(1) average
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of dense entries allocated up front.
pub const DEFAULT_DENSE_PREALLOC: usize = 100_000;

/// Default address bound above which [`TableMode::Auto`] migrates to a map.
pub const DEFAULT_DENSE_LIMIT: u64 = 1 << 22;

/// Address bound above which even [`TableMode::Dense`] migrates to a map.
pub const DENSE_CEILING: u64 = 1 << 28;

/// Backing strategy for an [`AddressTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableMode {
    /// Array-backed for every address up to [`DENSE_CEILING`].
    Dense,
    /// Always map-backed.
    Sparse,
    /// Array-backed until an address exceeds the dense limit, then map-backed.
    #[default]
    Auto,
}

#[derive(Debug, Clone)]
enum Backing<T> {
    Dense(Vec<T>),
    Sparse(FxHashMap<u64, T>),
}

/// Address → metadata table with lazy creation and multiplicative growth.
#[derive(Debug, Clone)]
pub struct AddressTable<T> {
    backing: Backing<T>,
    mode: TableMode,
    dense_limit: u64,
    fallback: T,
}

impl<T> AddressTable<T>
where
    T: Default + Clone + PartialEq,
{
    /// Creates a table using [`TableMode::Auto`].
    pub fn new() -> Self {
        Self::with_mode(TableMode::Auto)
    }

    /// Creates a table with the given backing mode.
    pub fn with_mode(mode: TableMode) -> Self {
        let backing = match mode {
            TableMode::Dense | TableMode::Auto => {
                Backing::Dense(vec![T::default(); DEFAULT_DENSE_PREALLOC])
            },
            TableMode::Sparse => Backing::Sparse(FxHashMap::default()),
        };
        Self {
            backing,
            mode,
            dense_limit: DEFAULT_DENSE_LIMIT,
            fallback: T::default(),
        }
    }

    /// Overrides the address bound used by [`TableMode::Auto`].
    pub fn with_dense_limit(mut self, limit: u64) -> Self {
        self.dense_limit = limit;
        self
    }

    /// Returns the configured mode.
    pub fn mode(&self) -> TableMode {
        self.mode
    }

    /// Returns `true` if the table is currently array-backed.
    pub fn is_dense(&self) -> bool {
        matches!(self.backing, Backing::Dense(_))
    }

    /// Number of addresses the dense backing covers without growing; for a
    /// sparse backing, the number of stored entries.
    pub fn span(&self) -> usize {
        match &self.backing {
            Backing::Dense(v) => v.len(),
            Backing::Sparse(m) => m.len(),
        }
    }

    /// Returns the metadata for `addr`, or the default if never written.
    #[inline]
    pub fn get(&self, addr: u64) -> &T {
        match &self.backing {
            Backing::Dense(v) => usize::try_from(addr)
                .ok()
                .and_then(|i| v.get(i))
                .unwrap_or(&self.fallback),
            Backing::Sparse(m) => m.get(&addr).unwrap_or(&self.fallback),
        }
    }

    /// Returns a mutable reference to `addr`'s metadata, creating it lazily.
    #[inline]
    pub fn get_mut(&mut self, addr: u64) -> &mut T {
        self.reserve_for(addr);
        match &mut self.backing {
            Backing::Dense(v) => {
                // reserve_for guarantees the index fits
                let idx = addr as usize;
                &mut v[idx]
            },
            Backing::Sparse(m) => m.entry(addr).or_default(),
        }
    }

    /// Writes `value` for `addr`.
    #[inline]
    pub fn set(&mut self, addr: u64, value: T) {
        *self.get_mut(addr) = value;
    }

    /// Resets `addr` to the default value.
    ///
    /// Sparse backings drop the entry so the map only holds live metadata.
    pub fn reset(&mut self, addr: u64) {
        match &mut self.backing {
            Backing::Dense(v) => {
                if let Some(slot) = usize::try_from(addr).ok().and_then(|i| v.get_mut(i)) {
                    *slot = T::default();
                }
            },
            Backing::Sparse(m) => {
                m.remove(&addr);
            },
        }
    }

    /// Iterates every address holding non-default metadata.
    ///
    /// Dense backings walk the whole span, so this is meant for invariant
    /// checks rather than the access path.
    pub fn iter_set(&self) -> Box<dyn Iterator<Item = (u64, &T)> + '_> {
        match &self.backing {
            Backing::Dense(v) => Box::new(
                v.iter()
                    .enumerate()
                    .filter(|(_, meta)| **meta != self.fallback)
                    .map(|(addr, meta)| (addr as u64, meta)),
            ),
            Backing::Sparse(m) => Box::new(
                m.iter()
                    .filter(|(_, meta)| **meta != self.fallback)
                    .map(|(&addr, meta)| (addr, meta)),
            ),
        }
    }

    /// Makes sure `addr` can be written, growing or migrating the backing.
    fn reserve_for(&mut self, addr: u64) {
        let limit = match self.mode {
            TableMode::Auto => self.dense_limit,
            TableMode::Dense | TableMode::Sparse => DENSE_CEILING,
        };
        if self.is_dense() && addr > limit {
            self.migrate_to_sparse();
        }
        if let Backing::Dense(v) = &mut self.backing {
            let idx = usize::try_from(addr).unwrap_or(usize::MAX);
            if idx >= v.len() {
                let grown = idx.saturating_mul(3) / 2 + 1;
                let new_len = grown.max(idx.saturating_add(1));
                v.resize(new_len, T::default());
            }
        }
    }

    fn migrate_to_sparse(&mut self) {
        let Backing::Dense(v) = &mut self.backing else {
            return;
        };
        let default = T::default();
        let mut map = FxHashMap::default();
        for (addr, meta) in std::mem::take(v).into_iter().enumerate() {
            if meta != default {
                map.insert(addr as u64, meta);
            }
        }
        debug!(entries = map.len(), limit = self.dense_limit, "address table migrated to sparse backing");
        self.backing = Backing::Sparse(map);
    }
}

impl<T> Default for AddressTable<T>
where
    T: Default + Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}
