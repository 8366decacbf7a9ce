//! State store: canonicalization and dedup
//!
//! The store interns every discovered state exactly once and hands out dense
//! `StateId`s that index the reachability graph's flat arrays. The dedup key
//! is the state's FP64 fingerprint; a fingerprint bucket holds the ids of
//! all states sharing that fingerprint, and equal-content lookups fall back
//! to full comparison, so a hash collision can never merge distinct states.
//!
//! The fingerprint index is a `DashMap` (FxHasher shards), which keeps the
//! store shareable with worker threads; id assignment itself is serialized
//! through the arena lock, so exactly one caller ever observes `is_new` for
//! a given content.

use crate::state::State;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::fmt;
use std::hash::BuildHasherDefault;

type FxBuildHasher = BuildHasherDefault<FxHasher>;
type FxDashMap<K, V> = DashMap<K, V, FxBuildHasher>;

/// Dense index of an interned state.
///
/// Ids are assigned in discovery order starting at 0 and index directly into
/// the store's arena and the reachability graph's adjacency arrays.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// The distinct-state cap was hit; exploration must halt with a partial
/// result instead of growing unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFull;

/// Interning store for discovered states.
///
/// Discarded at the end of a run; nothing is persisted.
pub struct StateStore {
    /// Fingerprint -> ids of states with that fingerprint. Almost always a
    /// single entry; more than one means a genuine FP64 collision.
    index: FxDashMap<u64, SmallVec<[StateId; 1]>>,
    /// Arena of interned states, indexed by `StateId`.
    states: RwLock<Vec<State>>,
    /// Hard cap on distinct states.
    max_states: usize,
}

impl StateStore {
    pub fn new(max_states: usize) -> Self {
        StateStore {
            index: DashMap::with_hasher(FxBuildHasher::default()),
            states: RwLock::new(Vec::new()),
            max_states,
        }
    }

    /// Intern a state, returning its id and whether it was newly inserted.
    ///
    /// Structurally equal content always yields the same id, with
    /// `is_new = false` on every call after the first. Returns
    /// `Err(StoreFull)` instead of inserting once `max_states` distinct
    /// states exist.
    pub fn intern(&self, state: State) -> Result<(StateId, bool), StoreFull> {
        let fp = state.fingerprint().0;
        let mut bucket = self.index.entry(fp).or_default();

        // Collision resolution: compare content against every id already in
        // the bucket.
        {
            let states = self.states.read();
            for &id in bucket.iter() {
                if states[id.as_usize()] == state {
                    return Ok((id, false));
                }
            }
        }

        let mut states = self.states.write();
        if states.len() >= self.max_states {
            return Err(StoreFull);
        }
        let id = StateId(states.len() as u32);
        states.push(state);
        bucket.push(id);
        Ok((id, true))
    }

    /// Look up a state's id without interning it.
    pub fn lookup(&self, state: &State) -> Option<StateId> {
        let bucket = self.index.get(&state.fingerprint().0)?;
        let states = self.states.read();
        bucket
            .iter()
            .copied()
            .find(|id| &states[id.as_usize()] == state)
    }

    /// Clone out the state for an id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: StateId) -> State {
        self.states.read()[id.as_usize()].clone()
    }

    /// Run a closure against the stored state without cloning it.
    pub fn with_state<R>(&self, id: StateId, f: impl FnOnce(&State) -> R) -> R {
        f(&self.states.read()[id.as_usize()])
    }

    /// Number of distinct interned states.
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn st(x: i64) -> State {
        State::from_pairs([("x", Value::int(x))])
    }

    #[test]
    fn intern_dedups_equal_content() {
        let store = StateStore::new(100);
        let (id1, new1) = store.intern(st(1)).unwrap();
        let (id2, new2) = store.intern(st(1)).unwrap();
        assert!(new1);
        assert!(!new2);
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_dense_in_discovery_order() {
        let store = StateStore::new(100);
        let (a, _) = store.intern(st(10)).unwrap();
        let (b, _) = store.intern(st(20)).unwrap();
        let (c, _) = store.intern(st(30)).unwrap();
        assert_eq!((a, b, c), (StateId(0), StateId(1), StateId(2)));
        assert_eq!(store.get(b), st(20));
    }

    #[test]
    fn max_states_is_enforced() {
        let store = StateStore::new(2);
        store.intern(st(1)).unwrap();
        store.intern(st(2)).unwrap();
        assert_eq!(store.intern(st(3)), Err(StoreFull));
        // Re-interning existing content still succeeds at the cap.
        assert_eq!(store.intern(st(2)).unwrap(), (StateId(1), false));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn lookup_finds_only_interned_states() {
        let store = StateStore::new(10);
        let (id, _) = store.intern(st(5)).unwrap();
        assert_eq!(store.lookup(&st(5)), Some(id));
        assert_eq!(store.lookup(&st(6)), None);
    }
}
