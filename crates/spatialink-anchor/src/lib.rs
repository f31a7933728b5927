//! # spatialink-anchor
//!
//! Deterministic location keys for world-anchored drawings.
//!
//! A world position is quantized to fixed-point micrometers, floored to
//! a precision bucket on each axis, and hashed with domain-separated
//! BLAKE3. Every producer that agrees on the precision agrees on the
//! key, and positions differing only below the precision collapse to the
//! same bucket. That coarsening is the dedup granularity control, not a
//! collision bug.

use spatialink_types::{LocationKey, QuantizedPosition};

/// Registered BLAKE3 context strings.
/// Using an unregistered context string is a protocol violation.
pub mod contexts {
    pub const LOCATION_KEY: &str = "SpatialInk v1 location-key";
    pub const TRANSACTION_REF: &str = "SpatialInk v1 transaction-ref";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[LOCATION_KEY, TRANSACTION_REF];
}

/// Floor each axis to its precision bucket boundary.
///
/// Rounding goes toward the fixed lower boundary (`div_euclid`), never
/// to nearest, so every position inside a bucket maps to the same
/// corner — including negative coordinates.
///
/// Precision must be >= 1; session configuration validates this before
/// any key is derived.
pub fn bucket(pos: QuantizedPosition, precision: i64) -> QuantizedPosition {
    debug_assert!(precision >= 1);
    QuantizedPosition {
        x: pos.x.div_euclid(precision) * precision,
        y: pos.y.div_euclid(precision) * precision,
        z: pos.z.div_euclid(precision) * precision,
    }
}

/// Derive the location key for a quantized position at the given
/// precision.
///
/// The key is a BLAKE3 digest, under [`contexts::LOCATION_KEY`], of the
/// three bucketed coordinates in little-endian order. Pure and total:
/// same bucket in, same key out.
pub fn location_key(pos: QuantizedPosition, precision: i64) -> LocationKey {
    let b = bucket(pos, precision);
    let mut input = [0u8; 24];
    input[..8].copy_from_slice(&b.x.to_le_bytes());
    input[8..16].copy_from_slice(&b.y.to_le_bytes());
    input[16..].copy_from_slice(&b.z.to_le_bytes());
    derive(contexts::LOCATION_KEY, &input)
}

/// Synthesize a deterministic transaction reference for a claim.
///
/// The in-process ledger has no chain to return a real transaction hash
/// from; this stands in so that audit fields round-trip the same way in
/// both backends.
pub fn transaction_ref(claim_id: u64, key: &LocationKey) -> String {
    let mut input = [0u8; 40];
    input[..8].copy_from_slice(&claim_id.to_le_bytes());
    input[8..].copy_from_slice(key);
    format!("0x{}", hex::encode(derive(contexts::TRANSACTION_REF, &input)))
}

/// Verify that a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

fn derive(context: &str, material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(material);
    *hasher.finalize().as_bytes()
}
