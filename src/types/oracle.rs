//! Asset Value Request Types
//!
//! One request represents one outstanding oracle price query. Requests
//! are independent: an unfulfilled request blocks nothing, and the
//! pairing with responses is an explicit state machine rather than
//! caller discipline.

use super::common::AssetKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monotonically assigned oracle request identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// Request lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Registered, awaiting the first value submission
    Registered,
    /// At least one value was submitted against this request.
    /// Further submissions remain valid: one request may carry any
    /// number of dates.
    Fulfilled,
}

/// One outstanding or fulfilled oracle query.
///
/// Requests never expire; a registered request stays valid until
/// fulfilled, and a fulfilled one keeps accepting submissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValueRequest {
    pub request_id: RequestId,
    pub kind: AssetKind,
    pub state: RequestState,
    pub created_at: DateTime<Utc>,
}

impl AssetValueRequest {
    /// Create a freshly registered request
    pub fn new(request_id: RequestId, kind: AssetKind) -> Self {
        Self {
            request_id,
            kind,
            state: RequestState::Registered,
            created_at: Utc::now(),
        }
    }

    /// Mark fulfilled. Idempotent: fulfilling twice is a no-op.
    pub fn fulfill(&mut self) {
        self.state = RequestState::Fulfilled;
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state == RequestState::Fulfilled
    }
}
