//! # spatialink-store
//!
//! Artist-scoped durable storage and the local claim cache.
//!
//! Everything an artist produces lands under `<data_dir>/<artist>/`:
//! finished drawings, metadata fallback copies, claim intents awaiting
//! submission or retry, and reconciled claims. Files are JSON, named by
//! a timestamp-derived identifier, so a directory listing reads as
//! history and survives loss of network access.
//!
//! ## Modules
//!
//! - [`cache`] — per-artist claim view for UI queries

pub mod cache;

pub use cache::LocalClaimCache;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use spatialink_types::{Claim, ClaimIntent, DrawingPayload};

/// Error types for local storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// I/O error reading or writing an artifact file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact file contents could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result type for local storage operations.
pub type Result<T> = std::result::Result<T, ArtifactError>;

const DRAWINGS_DIR: &str = "drawings";
const METADATA_DIR: &str = "metadata";
const INTENTS_DIR: &str = "intents";
const CLAIMS_DIR: &str = "claims";

/// Durable file storage rooted at one artist's data directory.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store for one artist, creating its directories.
    pub fn open(data_dir: &Path, artist: &str) -> Result<Self> {
        let root = data_dir.join(artist);
        for sub in [DRAWINGS_DIR, METADATA_DIR, INTENTS_DIR, CLAIMS_DIR] {
            fs::create_dir_all(root.join(sub))?;
        }
        Ok(Self { root })
    }

    /// Persist a finished drawing. Returns the file path.
    pub fn save_drawing(&self, payload: &DrawingPayload) -> Result<PathBuf> {
        let path = self
            .root
            .join(DRAWINGS_DIR)
            .join(format!("drawing_{}.json", timestamp_id()));
        fs::write(&path, serde_json::to_vec_pretty(payload)?)?;
        tracing::debug!(path = %path.display(), "drawing saved");
        Ok(path)
    }

    /// Store serialized metadata bytes verbatim. Returns a `file://` URI
    /// usable wherever a remote locator would go.
    pub fn save_metadata(&self, bytes: &[u8]) -> Result<String> {
        let path = self
            .root
            .join(METADATA_DIR)
            .join(format!("metadata_{}.json", timestamp_id()));
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), "metadata saved locally");
        Ok(format!("file://{}", path.display()))
    }

    /// Record a claim intent awaiting submission or retry. Returns the
    /// file path so the caller can clear it once the claim reconciles.
    pub fn save_intent(&self, intent: &ClaimIntent) -> Result<PathBuf> {
        let path = self
            .root
            .join(INTENTS_DIR)
            .join(format!("intent_{}.json", timestamp_id()));
        fs::write(&path, serde_json::to_vec_pretty(intent)?)?;
        Ok(path)
    }

    /// Remove a satisfied or obsolete claim intent.
    pub fn clear_intent(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    /// Load pending claim intents, oldest first.
    pub fn load_intents(&self) -> Result<Vec<ClaimIntent>> {
        self.load_dir(INTENTS_DIR)
    }

    /// Persist a reconciled claim.
    pub fn save_claim(&self, claim: &Claim) -> Result<PathBuf> {
        let path = self.root.join(CLAIMS_DIR).join(format!(
            "claim_{}_{}.json",
            claim.claim_id,
            timestamp_id()
        ));
        fs::write(&path, serde_json::to_vec_pretty(claim)?)?;
        tracing::debug!(claim_id = claim.claim_id, path = %path.display(), "claim saved");
        Ok(path)
    }

    /// Load every persisted claim, oldest file first.
    pub fn load_claims(&self) -> Result<Vec<Claim>> {
        self.load_dir(CLAIMS_DIR)
    }

    fn load_dir<T: serde::de::DeserializeOwned>(&self, sub: &str) -> Result<Vec<T>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(self.root.join(sub))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path)?;
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }
}

/// Timestamp-derived file identifier.
///
/// The counter suffix keeps ids unique when the clock resolution is
/// coarser than the write rate.
fn timestamp_id() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}_{}", nanos, SEQ.fetch_add(1, Ordering::Relaxed))
}
