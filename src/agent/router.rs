//! Message classification.
//!
//! The router maps a raw inbound event to a [`Command`] without touching
//! any external state; everything side-effecting happens in the
//! dispatcher. Classification is a pure function of the event, so every
//! rule here is unit-testable in isolation.

use uuid::Uuid;

use crate::api::Snapshot;

/// Inputs that all resolve to the help response.
const HELP_TRIGGERS: &[&str] = &["?", "？", "/h", "/H", "/help", "-H", "-h", "--h", "--H"];

/// Hint shown when a non-text message arrives.
pub const TEXT_ONLY_HINT: &str = "text messages only";

/// Category of an inbound event, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageCategory {
    PlainText,
    SystemSnapshot,
    Other(String),
}

impl From<&str> for MessageCategory {
    fn from(category: &str) -> Self {
        match category {
            "PLAIN_TEXT" => Self::PlainText,
            "SYSTEM_ACCOUNT_SNAPSHOT" => Self::SystemSnapshot,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One inbound chat event, with its payload already base64-decoded.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Opaque identifier of the sender.
    pub sender_id: String,
    pub category: MessageCategory,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(
        sender_id: impl Into<String>,
        category: MessageCategory,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            category,
            payload: payload.into(),
        }
    }

    /// Convenience constructor for a plain-text event.
    pub fn text(sender_id: impl Into<String>, content: &str) -> Self {
        Self::new(sender_id, MessageCategory::PlainText, content.as_bytes())
    }
}

/// The action an inbound message asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show usage help, optionally prefixed with a hint.
    Help { hint: Option<&'static str> },
    /// Claim today's token grant.
    Claim,
    /// Ask for a donate button.
    Donate,
    /// Broadcast the multisig account proposal (privileged).
    Proposal,
    /// Look up an asset and/or user by 128-bit identifier.
    LookupByIdentifier(Uuid),
    /// Look up a user by numeric identity number.
    LookupByIdentityNumber(u64),
    /// Funds arrived; acknowledge the deposit.
    DepositReceived(Snapshot),
    /// Free text; the dispatcher treats it as an asset symbol query.
    Unrecognized(String),
}

/// Classify one inbound event into a [`Command`].
pub fn classify(message: &InboundMessage) -> Command {
    match &message.category {
        MessageCategory::SystemSnapshot => {
            // A snapshot payload that does not decode is treated like any
            // other non-text event.
            match serde_json::from_slice::<Snapshot>(&message.payload) {
                Ok(snapshot) => Command::DepositReceived(snapshot),
                Err(_) => Command::Help {
                    hint: Some(TEXT_ONLY_HINT),
                },
            }
        }
        MessageCategory::Other(_) => Command::Help {
            hint: Some(TEXT_ONLY_HINT),
        },
        MessageCategory::PlainText => classify_text(&String::from_utf8_lossy(&message.payload)),
    }
}

fn classify_text(raw: &str) -> Command {
    let text = raw.trim();

    if HELP_TRIGGERS.contains(&text) {
        return Command::Help { hint: None };
    }

    match text {
        "/claim" => return Command::Claim,
        "/donate" => return Command::Donate,
        "/proposal" => return Command::Proposal,
        _ => {}
    }

    if let Ok(id) = Uuid::parse_str(text) {
        return Command::LookupByIdentifier(id);
    }
    if let Ok(number) = text.parse::<u64>() {
        return Command::LookupByIdentityNumber(number);
    }

    Command::Unrecognized(text.to_string())
}
