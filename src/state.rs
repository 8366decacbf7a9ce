//! State representation
//!
//! A state is a mapping from variable names to values. States are:
//! - Immutable: transitions build new states rather than mutating old ones
//! - Hashable: for state-space dedup during exploration
//! - Comparable: for deterministic ordering
//!
//! # Fingerprinting
//!
//! Each state carries a 64-bit FP64 fingerprint computed at construction
//! over its canonical serialization: the sorted (name, value) pairs of the
//! `OrdMap`. Structurally equal states always produce the same fingerprint;
//! the store resolves the (rare) collision by full content comparison.

use crate::fingerprint::{extend_str, FP64_INIT};
use crate::value::Value;
use im::OrdMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A 64-bit state fingerprint used as the dedup key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP({:016x})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A state: an immutable snapshot of all modeled variables.
///
/// States are the nodes of the graph explored by the checker. Variable maps
/// are persistent (`im::OrdMap`), so deriving a successor shares structure
/// with its parent.
pub struct State {
    vars: OrdMap<Arc<str>, Value>,
    /// Cached fingerprint, computed at construction.
    fingerprint: Fingerprint,
}

impl Clone for State {
    fn clone(&self) -> Self {
        State {
            vars: self.vars.clone(),
            fingerprint: self.fingerprint,
        }
    }
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        State::from_vars(OrdMap::new())
    }

    /// Create a state from a variable map.
    pub fn from_vars(vars: OrdMap<Arc<str>, Value>) -> Self {
        let fingerprint = compute_fingerprint(&vars);
        State { vars, fingerprint }
    }

    /// Create a state from (name, value) pairs.
    pub fn from_pairs(
        iter: impl IntoIterator<Item = (impl Into<Arc<str>>, Value)>,
    ) -> Self {
        let vars: OrdMap<Arc<str>, Value> =
            iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        State::from_vars(vars)
    }

    /// Get a variable's value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Get a variable's integer value, if present and an `Int`.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.vars.get(name).and_then(Value::as_int)
    }

    /// Get a variable's string value, if present and a `Str`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(Value::as_str)
    }

    /// Set a variable, returning a new state.
    pub fn with_var(&self, name: impl Into<Arc<str>>, value: Value) -> State {
        let mut vars = self.vars.clone();
        vars.insert(name.into(), value);
        State::from_vars(vars)
    }

    /// Update several variables at once, returning a new state.
    pub fn with_vars(
        &self,
        updates: impl IntoIterator<Item = (impl Into<Arc<str>>, Value)>,
    ) -> State {
        let mut vars = self.vars.clone();
        for (name, value) in updates {
            vars.insert(name.into(), value);
        }
        State::from_vars(vars)
    }

    /// All variables as (name, value) pairs in sorted name order.
    pub fn vars(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.vars.iter()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the state has no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The cached canonical fingerprint.
    ///
    /// Deterministic and total: depends only on variable names and values,
    /// never on insertion order or run.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

fn compute_fingerprint(vars: &OrdMap<Arc<str>, Value>) -> Fingerprint {
    let mut fp = FP64_INIT;
    for (name, value) in vars {
        fp = extend_str(fp, name);
        fp = value.fingerprint_extend(fp);
    }
    Fingerprint(fp)
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State{{")?;
        let mut first = true;
        for (name, value) in &self.vars {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}: {:?}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.vars {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{} = {}", name, value)?;
        }
        Ok(())
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.vars == other.vars
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.0.hash(state);
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Fingerprint first for speed; full comparison only on collision.
        let fp_cmp = self.fingerprint.cmp(&other.fingerprint);
        if fp_cmp != Ordering::Equal {
            return fp_cmp;
        }
        self.vars.cmp(&other.vars)
    }
}
