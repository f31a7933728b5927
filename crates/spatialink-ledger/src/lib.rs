//! # spatialink-ledger
//!
//! The authoritative ownership store for world-anchored drawings.
//!
//! A ledger maps location keys to claims and enforces at most one
//! active claim per key. Claim ids come from a single monotonic counter
//! starting at 1 and are never reused, even after revocation.
//!
//! ## Implementations
//!
//! - [`MemoryLedger`] — in-process reference implementation; its mutex
//!   is the serialization point for contended keys.
//! - [`RemoteLedger`] — HTTP client for the anchor service's
//!   transaction endpoint.
//! - [`LedgerBackend`] — either of the above, selected by session
//!   configuration.

pub mod memory;
pub mod remote;

pub use memory::MemoryLedger;
pub use remote::RemoteLedger;

use std::time::Duration;

use async_trait::async_trait;
use spatialink_types::{Claim, LocationKey, NewClaim};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Another claim is active for the location key.
    #[error("location already claimed")]
    AlreadyClaimed,

    /// The caller is not the recorded owner of the claim.
    #[error("only the owner may modify a claim")]
    NotOwner,

    /// No claim exists with the given id.
    #[error("claim not found: {0}")]
    NotFound(u64),

    /// The remote ledger could not be reached or answered malformed.
    #[error("ledger transport error: {0}")]
    Transport(String),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Atomic check-and-insert ownership store.
///
/// `claim` is the sole exclusivity authority: concurrent claims for the
/// same key must resolve as if executed in some sequential order, with
/// exactly one succeeding.
#[async_trait]
pub trait ClaimLedger: Send + Sync {
    /// True iff no active claim holds the key. Side-effect free.
    async fn is_available(&self, key: &LocationKey) -> Result<bool>;

    /// Atomically check the key and insert a new claim.
    async fn claim(&self, request: NewClaim) -> Result<Claim>;

    /// Replace the metadata URI of an existing claim. Owner only;
    /// position and location key are immutable once claimed.
    async fn update_metadata(&self, claim_id: u64, owner: &str, new_uri: &str) -> Result<Claim>;

    /// Deactivate a claim and free its location key immediately. Owner
    /// only; revoking an already-revoked claim changes nothing and
    /// succeeds.
    async fn revoke(&self, claim_id: u64, owner: &str) -> Result<Claim>;

    /// Fetch a claim by id. Revoked claims remain queryable for audit.
    async fn claim_of(&self, claim_id: u64) -> Result<Claim>;

    /// Ids of every claim the owner has made, in insertion order.
    async fn claims_by_owner(&self, owner: &str) -> Result<Vec<u64>>;
}

/// A configuration-selected ledger backend.
pub enum LedgerBackend {
    Memory(MemoryLedger),
    Remote(RemoteLedger),
}

impl LedgerBackend {
    pub fn memory() -> Self {
        Self::Memory(MemoryLedger::new())
    }

    pub fn remote(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::Remote(RemoteLedger::new(base_url, timeout)?))
    }
}

#[async_trait]
impl ClaimLedger for LedgerBackend {
    async fn is_available(&self, key: &LocationKey) -> Result<bool> {
        match self {
            Self::Memory(l) => l.is_available(key).await,
            Self::Remote(l) => l.is_available(key).await,
        }
    }

    async fn claim(&self, request: NewClaim) -> Result<Claim> {
        match self {
            Self::Memory(l) => l.claim(request).await,
            Self::Remote(l) => l.claim(request).await,
        }
    }

    async fn update_metadata(&self, claim_id: u64, owner: &str, new_uri: &str) -> Result<Claim> {
        match self {
            Self::Memory(l) => l.update_metadata(claim_id, owner, new_uri).await,
            Self::Remote(l) => l.update_metadata(claim_id, owner, new_uri).await,
        }
    }

    async fn revoke(&self, claim_id: u64, owner: &str) -> Result<Claim> {
        match self {
            Self::Memory(l) => l.revoke(claim_id, owner).await,
            Self::Remote(l) => l.revoke(claim_id, owner).await,
        }
    }

    async fn claim_of(&self, claim_id: u64) -> Result<Claim> {
        match self {
            Self::Memory(l) => l.claim_of(claim_id).await,
            Self::Remote(l) => l.claim_of(claim_id).await,
        }
    }

    async fn claims_by_owner(&self, owner: &str) -> Result<Vec<u64>> {
        match self {
            Self::Memory(l) => l.claims_by_owner(owner).await,
            Self::Remote(l) => l.claims_by_owner(owner).await,
        }
    }
}
