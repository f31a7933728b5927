//! The staged save pipeline.
//!
//! One save runs at a time per session. The pipeline is linear — no
//! stage re-entry, no parallel stages — and suspends only at the
//! publish and ledger I/O boundaries. Every stage maps its own failures
//! into the terminal outcome; nothing crosses a stage boundary
//! unmapped. The ledger's atomic claim call is the sole exclusivity
//! authority; the availability pre-check is advisory.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use spatialink_ledger::{ClaimLedger, LedgerBackend, LedgerError};
use spatialink_publish::{ContentStore, HttpContentStore, MetadataPublisher};
use spatialink_store::{ArtifactStore, LocalClaimCache};
use spatialink_types::{Claim, ClaimIntent, DrawingPayload, NewClaim};
use tokio::sync::{broadcast, Mutex};

use crate::config::SessionConfig;
use crate::events::{EventBus, SaveEvent};

/// Pipeline stages, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStage {
    CollectingStrokes,
    CheckingAvailability,
    PublishingMetadata,
    SubmittingClaim,
    Reconciling,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CollectingStrokes => "CollectingStrokes",
            Self::CheckingAvailability => "CheckingAvailability",
            Self::PublishingMetadata => "PublishingMetadata",
            Self::SubmittingClaim => "SubmittingClaim",
            Self::Reconciling => "Reconciling",
        };
        f.write_str(name)
    }
}

/// Why a save attempt failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFailure {
    /// The drawing had no strokes; nothing was published or claimed.
    NoStrokes,
    /// The location key is held by an active claim.
    LocationClaimed,
    /// Another save is already running in this session.
    SaveInProgress,
    /// The session was torn down before the pipeline finished.
    Cancelled,
    /// A stage failed in an unexpected way.
    Stage { stage: SaveStage, detail: String },
}

impl fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStrokes => f.write_str("NoStrokes"),
            Self::LocationClaimed => f.write_str("LocationClaimed"),
            Self::SaveInProgress => f.write_str("SaveInProgress"),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Stage { stage, detail } => write!(f, "{stage}Error: {detail}"),
        }
    }
}

/// Terminal result of a save attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SaveOutcome {
    Succeeded {
        claim: Claim,
        metadata_uri: String,
        /// True when the metadata lives only in local storage.
        used_fallback: bool,
    },
    Failed {
        reason: SaveFailure,
    },
}

/// A per-artist save session.
///
/// Owns the local claim cache and artifact store for one artist and
/// drives the save pipeline against the shared ledger.
pub struct SaveSession<L, S> {
    config: SessionConfig,
    ledger: Arc<L>,
    publisher: MetadataPublisher<S>,
    artifacts: ArtifactStore,
    cache: Mutex<LocalClaimCache>,
    events: EventBus,
    in_flight: AtomicBool,
    cancelled: AtomicBool,
}

impl SaveSession<LedgerBackend, HttpContentStore> {
    /// Build a session entirely from configuration: the ledger backend,
    /// content store, and storage paths all come from the config file.
    pub fn connect(config: SessionConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.ledger.request_timeout_secs);
        let ledger = match config.ledger.backend.as_str() {
            "remote" => LedgerBackend::remote(&config.ledger.url, timeout)?,
            _ => LedgerBackend::memory(),
        };
        let store = HttpContentStore::new(&config.publish.content_store_url)?;
        Self::new(config, Arc::new(ledger), store)
    }
}

impl<L: ClaimLedger, S: ContentStore> SaveSession<L, S> {
    /// Create a session over an existing ledger handle.
    ///
    /// The cache is rebuilt from any claims already persisted under the
    /// artist's data directory.
    pub fn new(config: SessionConfig, ledger: Arc<L>, store: S) -> anyhow::Result<Self> {
        config.validate()?;
        let artifacts = ArtifactStore::open(&config.data_dir(), &config.artist.artist_id)?;
        let cache = LocalClaimCache::load(&artifacts)?;
        let publisher = MetadataPublisher::new(
            store,
            artifacts.clone(),
            Duration::from_secs(config.publish.request_timeout_secs),
        );
        Ok(Self {
            config,
            ledger,
            publisher,
            artifacts,
            cache: Mutex::new(cache),
            events: EventBus::new(64),
            in_flight: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        })
    }

    /// Subscribe to save progress events.
    pub fn events(&self) -> broadcast::Receiver<SaveEvent> {
        self.events.subscribe()
    }

    /// Request cooperative teardown: the in-flight stage finishes, no
    /// further stage starts.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cached claims for this session's artist, in claim-id order.
    pub async fn owned_claims(&self) -> Vec<Claim> {
        let cache = self.cache.lock().await;
        cache
            .all_for_owner(&self.config.artist.artist_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Cached claim by id.
    pub async fn cached_claim(&self, claim_id: u64) -> Option<Claim> {
        self.cache.lock().await.get(claim_id).cloned()
    }

    /// Run one save attempt to completion.
    ///
    /// Emits a progress event per stage transition and exactly one
    /// terminal event, then returns the same terminal outcome.
    pub async fn save(&self, payload: DrawingPayload) -> SaveOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            let outcome = self.fail(SaveFailure::SaveInProgress);
            self.events.emit(SaveEvent::Completed {
                outcome: outcome.clone(),
            });
            return outcome;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let outcome = self.run(payload).await;
        self.events.emit(SaveEvent::Completed {
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn run(&self, payload: DrawingPayload) -> SaveOutcome {
        // Validation first: no side effects until the payload is known
        // to be saveable.
        self.enter(SaveStage::CollectingStrokes);
        if payload.is_empty() {
            return self.fail(SaveFailure::NoStrokes);
        }
        let centroid = match payload.centroid() {
            Some(c) => c,
            None => return self.fail(SaveFailure::NoStrokes),
        };
        let bytes = match serde_json::to_vec_pretty(&payload) {
            Ok(b) => b,
            Err(e) => return self.stage_error(SaveStage::CollectingStrokes, e),
        };
        let position = centroid.quantize();
        // One key serves both the pre-check and the submission.
        let key = spatialink_anchor::location_key(position, self.config.ledger.location_precision);
        tracing::debug!(
            key = hex::encode(key),
            strokes = payload.stroke_count(),
            "drawing collected"
        );

        if self.cancelled() {
            return self.fail(SaveFailure::Cancelled);
        }

        // Advisory only; the atomic claim below is the sole exclusivity
        // authority.
        if self.config.ledger.check_availability {
            self.enter(SaveStage::CheckingAvailability);
            match self.ledger.is_available(&key).await {
                Ok(true) => {}
                Ok(false) => return self.fail(SaveFailure::LocationClaimed),
                Err(e) => return self.stage_error(SaveStage::CheckingAvailability, e),
            }
            if self.cancelled() {
                return self.fail(SaveFailure::Cancelled);
            }
        }

        // Publish absorbs every remote failure into the local fallback;
        // the degradation travels with the outcome.
        self.enter(SaveStage::PublishingMetadata);
        let published = match self.publisher.publish(&bytes).await {
            Ok(p) => p,
            Err(e) => return self.stage_error(SaveStage::PublishingMetadata, e),
        };
        if self.cancelled() {
            return self.fail(SaveFailure::Cancelled);
        }

        self.enter(SaveStage::SubmittingClaim);
        let request = NewClaim {
            owner: self.config.artist.artist_id.clone(),
            artist_label: self.config.artist.label.clone(),
            location_key: key,
            position,
            metadata_uri: published.uri.clone(),
        };
        // Intent backup before the submission: if the transport dies
        // mid-claim, the file survives for a manual retry.
        let intent = ClaimIntent {
            request: request.clone(),
            created_at: unix_now(),
        };
        let intent_path = match self.artifacts.save_intent(&intent) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "claim intent could not be persisted");
                None
            }
        };

        let claim = match self.ledger.claim(request).await {
            Ok(claim) => claim,
            Err(LedgerError::AlreadyClaimed) => {
                // Lost the race between pre-check and submit; this
                // intent can never succeed.
                if let Some(path) = &intent_path {
                    let _ = self.artifacts.clear_intent(path);
                }
                return self.fail(SaveFailure::LocationClaimed);
            }
            Err(e) => {
                tracing::info!("claim intent retained for retry");
                return self.stage_error(SaveStage::SubmittingClaim, e);
            }
        };
        if self.cancelled() {
            // The claim went through; the retained intent lets a later
            // session reconcile it.
            return self.fail(SaveFailure::Cancelled);
        }

        self.enter(SaveStage::Reconciling);
        {
            let mut cache = self.cache.lock().await;
            cache.upsert(claim.clone());
        }
        // The drawing is persisted locally regardless of where the
        // metadata ended up.
        if let Err(e) = self.artifacts.save_drawing(&payload) {
            return self.stage_error(SaveStage::Reconciling, e);
        }
        if let Err(e) = self.artifacts.save_claim(&claim) {
            return self.stage_error(SaveStage::Reconciling, e);
        }
        if let Some(path) = &intent_path {
            let _ = self.artifacts.clear_intent(path);
        }

        tracing::info!(
            claim_id = claim.claim_id,
            uri = %published.uri,
            fallback = published.fallback,
            "save complete"
        );
        SaveOutcome::Succeeded {
            claim,
            metadata_uri: published.uri,
            used_fallback: published.fallback,
        }
    }

    fn enter(&self, stage: SaveStage) {
        tracing::debug!(%stage, "save stage entered");
        self.events.emit(SaveEvent::StageEntered { stage });
    }

    fn fail(&self, reason: SaveFailure) -> SaveOutcome {
        tracing::warn!(%reason, "save failed");
        SaveOutcome::Failed { reason }
    }

    fn stage_error(&self, stage: SaveStage, err: impl fmt::Display) -> SaveOutcome {
        self.fail(SaveFailure::Stage {
            stage,
            detail: err.to_string(),
        })
    }

    fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
