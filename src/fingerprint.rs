//! FP64 polynomial rolling hash for state fingerprinting
//!
//! States are identified by a 64-bit Rabin fingerprint computed over their
//! canonical serialization. The polynomial hash extends one byte at a time,
//! so composite values can fingerprint themselves incrementally without
//! building an intermediate byte buffer.
//!
//! # Algorithm
//!
//! FP64 is a polynomial rolling hash over GF(2^64) with an irreducible
//! polynomial as the modulus. A 256-entry byte table is precomputed lazily
//! on first use, after which extension is a shift, a mask, and a table
//! lookup per byte.
//!
//! Fingerprints are a dedup *key*, not a proof of equality: the state store
//! resolves fingerprint collisions by full content comparison.

use std::sync::OnceLock;

/// Irreducible polynomial used as the initial fingerprint value.
pub const FP64_INIT: u64 = 0x911498AE0E66BAD6;

const ONE: u64 = 0x8000000000000000;
const X63: u64 = 0x1;

/// Precomputed byte table for the polynomial hash, built once on first use.
static BYTE_MOD_TABLE: OnceLock<[u64; 256]> = OnceLock::new();

#[inline]
fn byte_mod_table() -> &'static [u64; 256] {
    BYTE_MOD_TABLE.get_or_init(|| compute_byte_mod_table(FP64_INIT))
}

/// Build the byte-at-a-time extension table from the irreducible polynomial.
fn compute_byte_mod_table(irred_poly: u64) -> [u64; 256] {
    // Powers x^i mod IrredPoly up to the highest exponent a byte step needs.
    const PLENGTH: usize = 72;
    let mut power = [0u64; PLENGTH];

    let mut t = ONE;
    for entry in power.iter_mut() {
        *entry = t;
        // t = t * x in GF(2^64)
        let mask = if (t & X63) != 0 { irred_poly } else { 0 };
        t = (t >> 1) ^ mask;
    }

    let mut table = [0u64; 256];
    for (j, entry) in table.iter_mut().enumerate() {
        let mut v = 0u64;
        for k in 0..=7 {
            if (j & (1usize << k)) != 0 {
                v ^= power[127 - 7 * 8 - k];
            }
        }
        *entry = v;
    }
    table
}

/// Extend a fingerprint by one byte.
#[inline]
pub fn extend_byte(fp: u64, b: u8) -> u64 {
    let table = byte_mod_table();
    let idx = ((b as u64) ^ fp) as usize & 0xFF;
    (fp >> 8) ^ table[idx]
}

/// Extend a fingerprint by an i64 (8 bytes, little-endian).
#[inline]
pub fn extend_i64(mut fp: u64, x: i64) -> u64 {
    for b in x.to_le_bytes() {
        fp = extend_byte(fp, b);
    }
    fp
}

/// Extend a fingerprint by a u64 (8 bytes, little-endian).
#[inline]
pub fn extend_u64(mut fp: u64, x: u64) -> u64 {
    for b in x.to_le_bytes() {
        fp = extend_byte(fp, b);
    }
    fp
}

/// Extend a fingerprint by a string's UTF-8 bytes, length-prefixed so that
/// adjacent strings cannot alias each other's boundaries.
#[inline]
pub fn extend_str(mut fp: u64, s: &str) -> u64 {
    fp = extend_u64(fp, s.len() as u64);
    for b in s.bytes() {
        fp = extend_byte(fp, b);
    }
    fp
}
