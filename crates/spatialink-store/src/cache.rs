//! Per-artist claim view for UI queries and offline recovery.

use std::collections::HashMap;

use spatialink_types::Claim;

use crate::{ArtifactStore, Result};

/// Denormalized, eventually consistent copy of the artist's claims.
///
/// Not authoritative: rebuilt from persisted claim files and updated
/// from successful save reconciliations. Lets the UI answer "what do I
/// own" without a network round trip.
#[derive(Debug, Default)]
pub struct LocalClaimCache {
    claims: HashMap<u64, Claim>,
}

impl LocalClaimCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from the claims persisted in the store.
    ///
    /// Later files win when a claim id appears more than once, so an
    /// updated record replaces its predecessor.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let mut cache = Self::new();
        for claim in store.load_claims()? {
            cache.upsert(claim);
        }
        Ok(cache)
    }

    pub fn upsert(&mut self, claim: Claim) {
        self.claims.insert(claim.claim_id, claim);
    }

    pub fn get(&self, claim_id: u64) -> Option<&Claim> {
        self.claims.get(&claim_id)
    }

    /// All cached claims for the owner, in claim-id order.
    pub fn all_for_owner(&self, owner: &str) -> Vec<&Claim> {
        let mut claims: Vec<&Claim> = self
            .claims
            .values()
            .filter(|c| c.owner == owner)
            .collect();
        claims.sort_by_key(|c| c.claim_id);
        claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spatialink_types::QuantizedPosition;

    fn claim(claim_id: u64, owner: &str) -> Claim {
        Claim {
            claim_id,
            owner: owner.to_string(),
            artist_label: "SpatialInkArtist".to_string(),
            location_key: [claim_id as u8; 32],
            position: QuantizedPosition::new(0, 0, 0),
            metadata_uri: format!("https://store.example/metadata/{claim_id}"),
            created_at: 1_700_000_000,
            is_active: true,
            transaction_ref: None,
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let mut cache = LocalClaimCache::new();
        assert!(cache.is_empty());

        cache.upsert(claim(1, "alice"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).expect("claim").owner, "alice");
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut cache = LocalClaimCache::new();
        cache.upsert(claim(1, "alice"));

        let mut updated = claim(1, "alice");
        updated.metadata_uri = "ipfs://QmNew".to_string();
        cache.upsert(updated);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).expect("claim").metadata_uri, "ipfs://QmNew");
    }

    #[test]
    fn test_all_for_owner_sorted_by_id() {
        let mut cache = LocalClaimCache::new();
        cache.upsert(claim(3, "alice"));
        cache.upsert(claim(1, "alice"));
        cache.upsert(claim(2, "bob"));

        let ids: Vec<u64> = cache
            .all_for_owner("alice")
            .iter()
            .map(|c| c.claim_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(cache.all_for_owner("nobody").is_empty());
    }

    #[test]
    fn test_load_rebuilds_from_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::open(dir.path(), "alice").expect("open");
        store.save_claim(&claim(1, "alice")).expect("save");
        store.save_claim(&claim(2, "alice")).expect("save");

        let cache = LocalClaimCache::load(&store).expect("load");
        assert_eq!(cache.len(), 2);
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_some());
    }
}
