//! Error types for trainbot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] crate::api::ApiError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read credential file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credential file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Errors from the request-token and PIN-sealing layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session private key is not valid base64: {0}")]
    KeyEncoding(#[from] base64::DecodeError),

    #[error("session private key must be a 32-byte seed or 64-byte keypair, got {len} bytes")]
    KeyLength { len: usize },

    #[error("session private key halves are inconsistent")]
    KeyMismatch,

    #[error("token claims serialization failed: {0}")]
    Claims(#[from] serde_json::Error),

    #[error("pin token must decode to at least 16 bytes, got {len}")]
    PinTokenLength { len: usize },

    #[error("pin sealing failed")]
    Seal,
}

/// Transport channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("gateway rejected the connection: {reason}")]
    Rejected { reason: String },

    #[error("invalid gateway frame: {0}")]
    InvalidFrame(String),

    #[error("failed to send outbound message: {0}")]
    SendFailed(#[from] crate::api::ApiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operation-encoding precondition violations.
///
/// The binary layout uses single-byte length prefixes, so oversized fields
/// are contract violations surfaced as errors rather than truncated bytes.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EncodeError {
    #[error("{field} is {len} bytes, exceeding the single-byte length prefix")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("public key is not valid hex: {0}")]
    PublicKeyHex(#[from] hex::FromHexError),

    #[error("owner set of {count} cannot satisfy threshold {threshold}")]
    InvalidThreshold { threshold: u8, count: usize },

    #[error("owner set must contain between 1 and 255 identities, got {count}")]
    InvalidOwnerCount { count: usize },

    #[error("operation payload truncated while reading {field}")]
    Truncated { field: &'static str },

    #[error("operation payload has {len} trailing bytes")]
    TrailingBytes { len: usize },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
