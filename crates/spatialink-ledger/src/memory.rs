//! In-process reference ledger.
//!
//! All state lives behind one async mutex. `claim` performs its
//! availability check and insert inside a single critical section with
//! no await points, which makes the mutex the global serialization
//! point for contended keys: of two concurrent claims for one key,
//! exactly one observes the key free.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use spatialink_types::{Claim, LocationKey, NewClaim};
use tokio::sync::Mutex;

use crate::{ClaimLedger, LedgerError, Result};

#[derive(Default)]
struct LedgerState {
    next_id: u64,
    claims: HashMap<u64, Claim>,
    active_by_key: HashMap<LocationKey, u64>,
    by_owner: HashMap<String, Vec<u64>>,
}

/// In-memory claim ledger.
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_id: 1,
                ..LedgerState::default()
            }),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimLedger for MemoryLedger {
    async fn is_available(&self, key: &LocationKey) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(!state.active_by_key.contains_key(key))
    }

    async fn claim(&self, request: NewClaim) -> Result<Claim> {
        let mut state = self.state.lock().await;
        if state.active_by_key.contains_key(&request.location_key) {
            return Err(LedgerError::AlreadyClaimed);
        }

        let claim_id = state.next_id;
        state.next_id += 1;

        let claim = Claim {
            claim_id,
            owner: request.owner.clone(),
            artist_label: request.artist_label,
            location_key: request.location_key,
            position: request.position,
            metadata_uri: request.metadata_uri,
            created_at: unix_now(),
            is_active: true,
            transaction_ref: Some(spatialink_anchor::transaction_ref(
                claim_id,
                &request.location_key,
            )),
        };

        state.active_by_key.insert(claim.location_key, claim_id);
        state
            .by_owner
            .entry(request.owner)
            .or_default()
            .push(claim_id);
        state.claims.insert(claim_id, claim.clone());

        tracing::info!(
            claim_id,
            key = hex::encode(claim.location_key),
            owner = %claim.owner,
            "location claimed"
        );

        Ok(claim)
    }

    async fn update_metadata(&self, claim_id: u64, owner: &str, new_uri: &str) -> Result<Claim> {
        let mut state = self.state.lock().await;
        let claim = state
            .claims
            .get_mut(&claim_id)
            .ok_or(LedgerError::NotFound(claim_id))?;
        if claim.owner != owner {
            return Err(LedgerError::NotOwner);
        }

        claim.metadata_uri = new_uri.to_string();
        tracing::debug!(claim_id, uri = new_uri, "claim metadata updated");
        Ok(claim.clone())
    }

    async fn revoke(&self, claim_id: u64, owner: &str) -> Result<Claim> {
        let mut state = self.state.lock().await;
        let claim = state
            .claims
            .get_mut(&claim_id)
            .ok_or(LedgerError::NotFound(claim_id))?;
        if claim.owner != owner {
            return Err(LedgerError::NotOwner);
        }

        if claim.is_active {
            claim.is_active = false;
            let key = claim.location_key;
            let revoked = claim.clone();
            state.active_by_key.remove(&key);
            tracing::info!(claim_id, key = hex::encode(key), "claim revoked");
            return Ok(revoked);
        }

        Ok(claim.clone())
    }

    async fn claim_of(&self, claim_id: u64) -> Result<Claim> {
        let state = self.state.lock().await;
        state
            .claims
            .get(&claim_id)
            .cloned()
            .ok_or(LedgerError::NotFound(claim_id))
    }

    async fn claims_by_owner(&self, owner: &str) -> Result<Vec<u64>> {
        let state = self.state.lock().await;
        Ok(state.by_owner.get(owner).cloned().unwrap_or_default())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
