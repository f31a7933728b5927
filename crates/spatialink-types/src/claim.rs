//! Ownership claims binding an artist and a drawing payload to a
//! location key.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{ArtistId, LocationKey, QuantizedPosition};

/// The inputs to a ledger claim submission.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewClaim {
    pub owner: ArtistId,
    /// Free-text artist label, carried for display.
    pub artist_label: String,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub location_key: LocationKey,
    /// Raw quantized position, before bucket rounding.
    pub position: QuantizedPosition,
    /// Pointer to the published drawing payload.
    pub metadata_uri: String,
}

/// A recorded ownership claim.
///
/// Created only by a successful ledger claim operation and never
/// physically deleted: revocation clears `is_active` and frees the
/// location key, but the record stays queryable by id for audit.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claim {
    /// Ledger-assigned id, monotonic from 1, never reused.
    pub claim_id: u64,
    pub owner: ArtistId,
    pub artist_label: String,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub location_key: LocationKey,
    /// Raw quantized position, before bucket rounding. Immutable.
    pub position: QuantizedPosition,
    pub metadata_uri: String,
    /// Unix timestamp assigned by the ledger.
    pub created_at: u64,
    pub is_active: bool,
    /// Audit reference for the submitting transaction.
    pub transaction_ref: Option<String>,
}

/// A claim submission persisted locally before it is sent to the ledger.
///
/// If the session dies or the transport fails mid-save, the intent file
/// survives and the submission can be retried later.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimIntent {
    pub request: NewClaim,
    /// Unix timestamp when the intent was recorded.
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim() -> Claim {
        Claim {
            claim_id: 7,
            owner: "0xabc".to_string(),
            artist_label: "SpatialInkArtist".to_string(),
            location_key: [0x5A; 32],
            position: QuantizedPosition::new(1_500_000, 500_000, 2_000_000),
            metadata_uri: "https://store.example/metadata/1".to_string(),
            created_at: 1_700_000_000,
            is_active: true,
            transaction_ref: Some("0xdeadbeef".to_string()),
        }
    }

    #[test]
    fn test_claim_json_roundtrip() {
        let claim = sample_claim();
        let json = serde_json::to_string(&claim).expect("serialize");
        let parsed: Claim = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.claim_id, 7);
        assert_eq!(parsed.location_key, [0x5A; 32]);
        assert_eq!(parsed.position, claim.position);
        assert!(parsed.is_active);
    }

    #[test]
    fn test_location_key_serialized_as_hex() {
        let json = serde_json::to_string(&sample_claim()).expect("serialize");
        assert!(json.contains(&"5a".repeat(32)));
    }

    #[test]
    fn test_intent_json_roundtrip() {
        let intent = ClaimIntent {
            request: NewClaim {
                owner: "0xabc".to_string(),
                artist_label: "SpatialInkArtist".to_string(),
                location_key: [0x01; 32],
                position: QuantizedPosition::new(0, 0, 0),
                metadata_uri: "file:///tmp/metadata_1.json".to_string(),
            },
            created_at: 1_700_000_001,
        };
        let json = serde_json::to_string(&intent).expect("serialize");
        let parsed: ClaimIntent = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.request.owner, "0xabc");
        assert_eq!(parsed.created_at, 1_700_000_001);
    }
}
