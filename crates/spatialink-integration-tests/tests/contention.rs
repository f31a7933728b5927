//! Integration test: concurrent claims for one location key.
//!
//! Two artists pass the advisory availability pre-check for the same
//! key before either submits, then both submit. The ledger must resolve
//! the race to exactly one winner; the loser's pipeline ends in
//! `LocationClaimed` with no claim record.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use spatialink_ledger::{ClaimLedger, MemoryLedger};
use spatialink_session::{SaveFailure, SaveOutcome, SaveSession, SessionConfig};
use spatialink_types::{Claim, DrawingPayload, LocationKey, NewClaim, Stroke};
use tokio::sync::Barrier;

/// Ledger wrapper that holds every claim submission at a barrier until
/// all contenders have passed their availability pre-check and arrived
/// at the submit stage. This forces the check/submit interleaving the
/// race scenario describes.
struct GatedLedger {
    inner: MemoryLedger,
    gate: Barrier,
}

impl GatedLedger {
    fn new(contenders: usize) -> Self {
        Self {
            inner: MemoryLedger::new(),
            gate: Barrier::new(contenders),
        }
    }
}

#[async_trait]
impl ClaimLedger for GatedLedger {
    async fn is_available(&self, key: &LocationKey) -> spatialink_ledger::Result<bool> {
        self.inner.is_available(key).await
    }

    async fn claim(&self, request: NewClaim) -> spatialink_ledger::Result<Claim> {
        self.gate.wait().await;
        self.inner.claim(request).await
    }

    async fn update_metadata(
        &self,
        claim_id: u64,
        owner: &str,
        new_uri: &str,
    ) -> spatialink_ledger::Result<Claim> {
        self.inner.update_metadata(claim_id, owner, new_uri).await
    }

    async fn revoke(&self, claim_id: u64, owner: &str) -> spatialink_ledger::Result<Claim> {
        self.inner.revoke(claim_id, owner).await
    }

    async fn claim_of(&self, claim_id: u64) -> spatialink_ledger::Result<Claim> {
        self.inner.claim_of(claim_id).await
    }

    async fn claims_by_owner(&self, owner: &str) -> spatialink_ledger::Result<Vec<u64>> {
        self.inner.claims_by_owner(owner).await
    }
}

struct StaticStore;

#[async_trait]
impl spatialink_publish::ContentStore for StaticStore {
    async fn put(&self, _body: &[u8]) -> spatialink_publish::Result<String> {
        Ok("https://store.example/metadata/race".to_string())
    }
}

fn config(dir: &Path, artist: &str) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.storage.data_dir = dir.display().to_string();
    config.artist.artist_id = artist.to_string();
    config.artist.label = artist.to_string();
    config
}

fn drawing() -> DrawingPayload {
    DrawingPayload {
        strokes: vec![Stroke {
            points: vec![[2.5, 1.5, 3.5]],
            color: "#0000FF".to_string(),
            width: 0.02,
            brush_type: "round".to_string(),
        }],
        finished_at: 1_700_000_000,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_claims_resolve_to_one_winner() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = Arc::new(GatedLedger::new(2));

    let alice = Arc::new(
        SaveSession::new(config(dir.path(), "alice"), Arc::clone(&ledger), StaticStore)
            .expect("alice session"),
    );
    let bob = Arc::new(
        SaveSession::new(config(dir.path(), "bob"), Arc::clone(&ledger), StaticStore)
            .expect("bob session"),
    );

    // Both sessions pass the pre-check (the ledger is empty), then meet
    // at the barrier inside claim().
    let a = tokio::spawn({
        let alice = Arc::clone(&alice);
        async move { alice.save(drawing()).await }
    });
    let b = tokio::spawn({
        let bob = Arc::clone(&bob);
        async move { bob.save(drawing()).await }
    });

    let (a, b) = (a.await.expect("join alice"), b.await.expect("join bob"));

    let succeeded = [&a, &b]
        .iter()
        .filter(|o| matches!(o, SaveOutcome::Succeeded { .. }))
        .count();
    let claimed_away = [&a, &b]
        .iter()
        .filter(|o| {
            matches!(
                o,
                SaveOutcome::Failed {
                    reason: SaveFailure::LocationClaimed
                }
            )
        })
        .count();
    assert_eq!(succeeded, 1, "exactly one concurrent claim may win");
    assert_eq!(claimed_away, 1, "the loser sees LocationClaimed");

    // The ledger holds exactly one active claim for the key.
    let all_ids = [
        ledger.claims_by_owner("alice").await.expect("alice claims"),
        ledger.claims_by_owner("bob").await.expect("bob claims"),
    ]
    .concat();
    assert_eq!(all_ids.len(), 1);
    let winner = ledger.claim_of(all_ids[0]).await.expect("winning claim");
    assert!(winner.is_active);

    // Only the winner's cache holds a claim.
    let cached = alice.owned_claims().await.len() + bob.owned_claims().await.len();
    assert_eq!(cached, 1);
}
