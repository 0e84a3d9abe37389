//! Deterministic trace identifiers.
//!
//! Financial actions are made idempotent by handing the remote ledger a
//! trace key derived from the acting user and a scope string. The remote
//! side deduplicates on the key, so the bot needs no local storage: the
//! daily claim scope is the calendar date, which rolls the key over at
//! midnight and pins it for the rest of the day.
//!
//! Derivation is UUIDv5 under a fixed application namespace. Stability and
//! collision resistance over UUIDs and ISO dates are the requirements here,
//! not wire compatibility with any other derivation scheme.

use chrono::NaiveDate;
use uuid::Uuid;

/// Namespace for every trace the bot derives.
const TRACE_NAMESPACE: Uuid = Uuid::from_bytes([
    0x5b, 0x1e, 0x0c, 0x4d, 0x9f, 0x2a, 0x4c, 0x8e, 0x8d, 0x11, 0x6f, 0x5a, 0x2b, 0x7c, 0x91, 0x34,
]);

/// Derive the trace key for `(user, scope)`.
///
/// Equal inputs always yield the same key; distinct users or scopes yield
/// distinct keys (up to UUIDv5 collision resistance).
pub fn derive_trace(user_id: &str, scope: &str) -> Uuid {
    let mut seed = Vec::with_capacity(user_id.len() + scope.len() + 1);
    seed.extend_from_slice(user_id.as_bytes());
    seed.push(0);
    seed.extend_from_slice(scope.as_bytes());
    Uuid::new_v5(&TRACE_NAMESPACE, &seed)
}

/// Trace key for a user's daily claim on `day`.
pub fn claim_trace(user_id: &str, day: NaiveDate) -> Uuid {
    derive_trace(user_id, &day.format("%Y-%m-%d").to_string())
}

/// Deterministic one-to-one conversation identifier.
///
/// Symmetric in its arguments: both participants derive the same id.
pub fn unique_conversation_id(a: &str, b: &str) -> Uuid {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    derive_trace(low, high)
}
