//! HTTP client for the remote anchor-ledger service.
//!
//! The service exposes the ledger operations as plain JSON
//! request/response; consensus latency and retries are its concern, not
//! ours. Every transport failure, including timeouts, maps to
//! [`LedgerError::Transport`]; rejections carry a reason tag that maps
//! back to the matching ledger error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use spatialink_types::{Claim, LocationKey, NewClaim};

use crate::{ClaimLedger, LedgerError, Result};

/// Remote claim ledger client.
pub struct RemoteLedger {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct UpdateMetadataRequest {
    owner: String,
    metadata_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RevokeRequest {
    owner: String,
}

/// Rejection body returned by the service on non-2xx responses.
#[derive(Debug, Serialize, Deserialize)]
struct RejectionBody {
    reason: String,
    #[serde(default)]
    claim_id: u64,
}

impl RemoteLedger {
    /// Create a client for the given service base URL.
    ///
    /// `base_url` should be like `http://localhost:8545` (no trailing
    /// slash). The timeout applies to every request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_rejection(status.as_u16(), &body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| LedgerError::Transport(format!("malformed response: {e}")))
    }
}

/// Map a non-success response to the matching ledger error.
fn map_rejection(status: u16, body: &str) -> LedgerError {
    if let Ok(rejection) = serde_json::from_str::<RejectionBody>(body) {
        match rejection.reason.as_str() {
            "AlreadyClaimed" => return LedgerError::AlreadyClaimed,
            "NotOwner" => return LedgerError::NotOwner,
            "NotFound" => return LedgerError::NotFound(rejection.claim_id),
            _ => {}
        }
    }
    LedgerError::Transport(format!("server returned {status}: {body}"))
}

#[async_trait]
impl ClaimLedger for RemoteLedger {
    async fn is_available(&self, key: &LocationKey) -> Result<bool> {
        let url = self.url(&format!("/claims/availability/{}", hex::encode(key)));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let parsed: AvailabilityResponse = Self::decode(resp).await?;
        Ok(parsed.available)
    }

    async fn claim(&self, request: NewClaim) -> Result<Claim> {
        tracing::debug!(
            key = hex::encode(request.location_key),
            owner = %request.owner,
            "submitting claim transaction"
        );
        let resp = self
            .client
            .post(self.url("/claims"))
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn update_metadata(&self, claim_id: u64, owner: &str, new_uri: &str) -> Result<Claim> {
        let body = UpdateMetadataRequest {
            owner: owner.to_string(),
            metadata_uri: new_uri.to_string(),
        };
        let resp = self
            .client
            .post(self.url(&format!("/claims/{claim_id}/metadata")))
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn revoke(&self, claim_id: u64, owner: &str) -> Result<Claim> {
        let body = RevokeRequest {
            owner: owner.to_string(),
        };
        let resp = self
            .client
            .post(self.url(&format!("/claims/{claim_id}/revoke")))
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn claim_of(&self, claim_id: u64) -> Result<Claim> {
        let resp = self
            .client
            .get(self.url(&format!("/claims/{claim_id}")))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn claims_by_owner(&self, owner: &str) -> Result<Vec<u64>> {
        let resp = self
            .client
            .get(self.url(&format!("/artists/{owner}/claims")))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spatialink_types::QuantizedPosition;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let ledger =
            RemoteLedger::new("http://localhost:8545/", Duration::from_secs(5)).expect("client");
        assert_eq!(ledger.base_url, "http://localhost:8545");
        assert_eq!(ledger.url("/claims"), "http://localhost:8545/claims");
    }

    #[test]
    fn test_rejection_mapping() {
        assert!(matches!(
            map_rejection(409, r#"{"reason":"AlreadyClaimed"}"#),
            LedgerError::AlreadyClaimed
        ));
        assert!(matches!(
            map_rejection(403, r#"{"reason":"NotOwner"}"#),
            LedgerError::NotOwner
        ));
        assert!(matches!(
            map_rejection(404, r#"{"reason":"NotFound","claim_id":12}"#),
            LedgerError::NotFound(12)
        ));
        assert!(matches!(
            map_rejection(500, "internal server error"),
            LedgerError::Transport(_)
        ));
    }

    #[test]
    fn test_claim_request_wire_roundtrip() {
        let request = NewClaim {
            owner: "0xabc".to_string(),
            artist_label: "SpatialInkArtist".to_string(),
            location_key: [0x5A; 32],
            position: QuantizedPosition::new(1_500_000, 500_000, 2_000_000),
            metadata_uri: "ipfs://QmTest123".to_string(),
        };
        let json = serde_json::to_string(&request).expect("serialize");
        let parsed: NewClaim = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.owner, "0xabc");
        assert_eq!(parsed.location_key, [0x5A; 32]);
        assert_eq!(parsed.metadata_uri, "ipfs://QmTest123");
    }

    #[test]
    fn test_availability_response_parse() {
        let parsed: AvailabilityResponse =
            serde_json::from_str(r#"{"available":false}"#).expect("parse");
        assert!(!parsed.available);
    }
}
