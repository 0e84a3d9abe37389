//! External service capabilities.
//!
//! The dispatcher never talks to the network directly; it consumes the
//! [`MixinApi`] trait, which narrows the remote service to exactly the
//! operations the bot performs. The reqwest-backed implementation lives in
//! [`client`], the request-token and PIN-sealing seams in [`auth`].

pub mod auth;
pub mod client;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use client::ApiClient;

/// Remote failure code for a transfer trace already paid by another session.
pub const ERR_DUPLICATE_TRACE: i64 = 20125;
/// Remote failure code for an exhausted bot balance.
pub const ERR_INSUFFICIENT_BALANCE: i64 = 20117;

/// Errors from the remote service boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote error {code} (status {status}): {description}")]
    Remote {
        status: i64,
        code: i64,
        description: String,
    },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("attachment upload rejected with status {status}")]
    UploadRejected { status: u16 },

    #[error(transparent)]
    Auth(#[from] crate::error::AuthError),
}

impl ApiError {
    /// Remote failure code, when the service returned a structured error.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The looked-up entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote { status, code, .. } if *status == 404 || *code == 404)
    }

    /// The transfer trace was already paid by someone else (lost race).
    pub fn is_duplicate_trace(&self) -> bool {
        self.code() == Some(ERR_DUPLICATE_TRACE)
    }

    /// The bot account cannot cover the transfer amount.
    pub fn is_insufficient_balance(&self) -> bool {
        self.code() == Some(ERR_INSUFFICIENT_BALANCE)
    }
}

/// A messenger user record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub identity_number: String,
    #[serde(default)]
    pub full_name: String,
}

/// A network asset record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: Uuid,
    #[serde(default)]
    pub chain_id: Option<Uuid>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub price_usd: Option<String>,
}

/// A transfer as recorded by the remote ledger.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transfer {
    #[serde(default)]
    pub snapshot_id: Option<String>,
    pub trace_id: Uuid,
    pub asset_id: Uuid,
    #[serde(default)]
    pub opponent_id: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub memo: String,
}

impl Transfer {
    /// Whether the ledger recorded a settlement for this transfer.
    pub fn is_settled(&self) -> bool {
        self.snapshot_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// A funds-received notification, decoded from a snapshot event payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub snapshot_id: Option<String>,
    pub asset_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

/// A multisig transaction acknowledgment.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

/// Upload slot for an attachment, created before sending an image.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub attachment_id: String,
    pub upload_url: String,
}

/// A new transfer to submit to the ledger.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub asset_id: Uuid,
    pub opponent_id: String,
    pub amount: Decimal,
    pub trace_id: Uuid,
    pub memo: String,
}

/// A multisig transaction to broadcast to a fixed receiver set.
#[derive(Debug, Clone)]
pub struct MultisigTransactionRequest {
    pub asset_id: Uuid,
    pub amount: Decimal,
    pub trace_id: Uuid,
    pub memo: String,
    pub receivers: Vec<Uuid>,
    pub threshold: u8,
}

/// The remote operations the dispatcher is allowed to perform.
///
/// Lookups return `Ok(None)` for missing entities; every other remote
/// failure surfaces as [`ApiError`] for the dispatcher's failure policy.
#[async_trait]
pub trait MixinApi: Send + Sync {
    /// Fetch a user by id or identity number.
    async fn lookup_user(&self, id: &str) -> Result<Option<User>, ApiError>;

    /// Fetch a network asset by id.
    async fn lookup_asset_by_id(&self, asset_id: Uuid) -> Result<Option<Asset>, ApiError>;

    /// Search network assets by symbol fragment.
    async fn search_assets_by_symbol(&self, query: &str) -> Result<Vec<Asset>, ApiError>;

    /// Read a prior transfer recorded under an idempotency trace.
    async fn read_transfer_by_trace(&self, trace_id: Uuid) -> Result<Option<Transfer>, ApiError>;

    /// Submit a transfer under an idempotency trace.
    async fn create_transfer(&self, request: TransferRequest) -> Result<Transfer, ApiError>;

    /// Broadcast a multisig transaction carrying an encoded memo.
    async fn create_multisig_transaction(
        &self,
        request: MultisigTransactionRequest,
    ) -> Result<Transaction, ApiError>;

    /// Reserve an attachment upload slot.
    async fn create_attachment(&self) -> Result<Attachment, ApiError>;
}
