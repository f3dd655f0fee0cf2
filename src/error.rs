//! Engine Error Codes Registry
//!
//! Error code format: TC-{module}-{sequence}
//! - TC-ORACLE: Asset value registry errors
//! - TC-LEDGER: Production ledger errors
//! - TC-TRUSTED: Trusted data errors
//! - TC-CLEARING: Clearing/settlement errors
//! - TC-ESCROW: Escrow margin account errors
//! - TC-NUM: Numeric errors

use thiserror::Error;

/// Engine Result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // ============================================================
    // Oracle Errors (TC-ORACLE-*)
    // ============================================================
    /// [TC-ORACLE-001] Request was never registered
    #[error("[TC-ORACLE-001] Unknown asset value request {request_id}")]
    UnknownRequest { request_id: u64 },

    /// [TC-ORACLE-002] Unparseable date key
    #[error("[TC-ORACLE-002] Invalid date key {date:?}, expected YYMMDD digits")]
    InvalidDate { date: String },

    /// [TC-ORACLE-003] Unparseable month key
    #[error("[TC-ORACLE-003] Invalid month key {month:?}, expected YYMM digits")]
    InvalidMonth { month: String },

    // ============================================================
    // Ledger Errors (TC-LEDGER-*)
    // ============================================================
    /// [TC-LEDGER-001] Producer not known to the directory
    #[error("[TC-LEDGER-001] Unknown producer {unique_id}")]
    UnknownProducer { unique_id: String },

    /// [TC-LEDGER-002] Producer exists but is not in Active status
    #[error("[TC-LEDGER-002] Producer {unique_id} is not active")]
    ProducerNotActive { unique_id: String },

    // ============================================================
    // Trusted Data Errors (TC-TRUSTED-*)
    // ============================================================
    /// [TC-TRUSTED-001] No trusted record for the settlement key
    #[error("[TC-TRUSTED-001] No trusted data for producer {unique_id}, key {key}")]
    NoTrustedData { unique_id: String, key: String },

    /// [TC-TRUSTED-002] Settlement key does not match the engine's mode
    #[error("[TC-TRUSTED-002] Settlement key {got} invalid for {expected} settlement")]
    SettleKeyMismatch { expected: String, got: String },

    // ============================================================
    // Clearing Errors (TC-CLEARING-*)
    // ============================================================
    /// [TC-CLEARING-001] Period already settled, exactly-once violated
    #[error("[TC-CLEARING-001] Producer {unique_id}, key {key} already cleared")]
    AlreadyCleared { unique_id: String, key: String },

    /// [TC-CLEARING-002] Trusted volume of zero cannot anchor a deviation
    #[error("[TC-CLEARING-002] Trusted volume is zero for producer {unique_id}, key {key}")]
    ZeroTrustedVolume { unique_id: String, key: String },

    /// [TC-CLEARING-003] Reward token mint rejected the settlement
    #[error("[TC-CLEARING-003] Reward mint failed: {reason}")]
    MintFailed { reason: String },

    // ============================================================
    // Escrow Errors (TC-ESCROW-*)
    // ============================================================
    /// [TC-ESCROW-001] Withdrawal exceeds the deposited balance
    #[error("[TC-ESCROW-001] Insufficient escrow balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    /// [TC-ESCROW-002] Penalty exceeds margin under the strict debit policy
    #[error("[TC-ESCROW-002] Insufficient margin for penalty: required {required}, available {available}")]
    InsufficientMargin { required: u128, available: u128 },

    // ============================================================
    // Numeric Errors (TC-NUM-*)
    // ============================================================
    /// [TC-NUM-001] Checked arithmetic overflowed
    #[error("[TC-NUM-001] Amount computation overflow")]
    AmountOverflow,

    // ============================================================
    // General Errors
    // ============================================================
    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid state
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for EngineError {
    fn from(err: sled::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}
