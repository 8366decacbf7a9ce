//! Model values
//!
//! A `Value` is the content of one state variable: a tagged, content-hashable
//! datum with a total order. The model checker never interprets values; it
//! only compares, orders, and fingerprints them. Collection values use `im`
//! persistent structures so cloning a state shares structure instead of deep
//! copying.
//!
//! Non-determinism is never hidden inside a value: an action that "picks any
//! element of a set" enumerates one successor per element.

use crate::fingerprint::{extend_byte, extend_i64, extend_str, extend_u64};
use im::{OrdMap, OrdSet, Vector};
use std::fmt;
use std::sync::Arc;

/// A single state-variable value.
///
/// Variants carry a type tag into the fingerprint so that, e.g., the integer
/// `1` and the string `"1"` can never alias.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    /// Finite set, iterated in sorted order.
    Set(OrdSet<Value>),
    /// Finite sequence.
    Seq(Vector<Value>),
    /// Record with string field names, iterated in sorted field order.
    Record(OrdMap<Arc<str>, Value>),
}

impl Value {
    pub fn int(n: i64) -> Value {
        Value::Int(n)
    }

    pub fn str(s: impl Into<Arc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(items.into_iter().collect())
    }

    pub fn seq(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Seq(items.into_iter().collect())
    }

    pub fn record(
        fields: impl IntoIterator<Item = (impl Into<Arc<str>>, Value)>,
    ) -> Value {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extend a running FP64 fingerprint with this value.
    ///
    /// Tag first, then contents. Collections extend with their length before
    /// their elements so a prefix cannot alias a shorter collection.
    pub fn fingerprint_extend(&self, mut fp: u64) -> u64 {
        fp = extend_byte(fp, self.tag());
        match self {
            Value::Bool(b) => extend_byte(fp, *b as u8),
            Value::Int(n) => extend_i64(fp, *n),
            Value::Str(s) => extend_str(fp, s),
            Value::Set(set) => {
                fp = extend_u64(fp, set.len() as u64);
                for elem in set {
                    fp = elem.fingerprint_extend(fp);
                }
                fp
            }
            Value::Seq(seq) => {
                fp = extend_u64(fp, seq.len() as u64);
                for elem in seq {
                    fp = elem.fingerprint_extend(fp);
                }
                fp
            }
            Value::Record(rec) => {
                fp = extend_u64(fp, rec.len() as u64);
                for (name, val) in rec {
                    fp = extend_str(fp, name);
                    fp = val.fingerprint_extend(fp);
                }
                fp
            }
        }
    }

    #[inline]
    fn tag(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Str(_) => 2,
            Value::Set(_) => 3,
            Value::Seq(_) => 4,
            Value::Record(_) => 5,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::str(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Set(set) => {
                write!(f, "{{")?;
                for (i, elem) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "}}")
            }
            Value::Seq(seq) => {
                write!(f, "[")?;
                for (i, elem) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "]")
            }
            Value::Record(rec) => {
                write!(f, "(")?;
                for (i, (name, val)) in rec.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, val)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FP64_INIT;

    #[test]
    fn structural_equality() {
        assert_eq!(Value::int(1), Value::int(1));
        assert_ne!(Value::int(1), Value::int(2));
        assert_eq!(
            Value::set([Value::int(2), Value::int(1)]),
            Value::set([Value::int(1), Value::int(2)]),
        );
        assert_ne!(
            Value::seq([Value::int(1), Value::int(2)]),
            Value::seq([Value::int(2), Value::int(1)]),
        );
    }

    #[test]
    fn fingerprint_tracks_equality() {
        let a = Value::set([Value::int(1), Value::int(2)]);
        let b = Value::set([Value::int(2), Value::int(1)]);
        assert_eq!(a.fingerprint_extend(FP64_INIT), b.fingerprint_extend(FP64_INIT));

        let c = Value::set([Value::int(1)]);
        assert_ne!(a.fingerprint_extend(FP64_INIT), c.fingerprint_extend(FP64_INIT));
    }

    #[test]
    fn type_tags_separate_variants() {
        // Int 1 and Str "1" must not collide.
        let int_fp = Value::int(1).fingerprint_extend(FP64_INIT);
        let str_fp = Value::str("1").fingerprint_extend(FP64_INIT);
        assert_ne!(int_fp, str_fp);

        // Empty set and empty seq must not collide.
        let set_fp = Value::set([]).fingerprint_extend(FP64_INIT);
        let seq_fp = Value::seq([]).fingerprint_extend(FP64_INIT);
        assert_ne!(set_fp, seq_fp);
    }

    #[test]
    fn record_fields_sorted_in_display() {
        let r = Value::record([("b", Value::int(2)), ("a", Value::int(1))]);
        assert_eq!(r.to_string(), "(a: 1, b: 2)");
    }

    #[test]
    fn total_order_is_consistent() {
        let mut vals = vec![Value::int(3), Value::Bool(true), Value::int(1), Value::str("x")];
        vals.sort();
        let resorted = {
            let mut v = vals.clone();
            v.sort();
            v
        };
        assert_eq!(vals, resorted);
    }
}
