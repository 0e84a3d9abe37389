//! Account-proposal operations and their binary memo layout.
//!
//! A proposal travels as the memo of a multisig transaction, encoded as:
//!
//! ```text
//! [16 bytes: id as raw UUID] [1: kind] [1: curve]
//! [1: len(public)] [public] [1: len(extra)] [extra]
//! ```
//!
//! For a multisig account proposal the `extra` field is itself
//! `[threshold:1][total:1][owner_1 UUID]...[owner_n UUID]`. Length
//! prefixes are a single byte, so fields over 255 bytes are rejected as
//! [`EncodeError::FieldTooLong`] instead of being truncated.

use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

use crate::error::EncodeError;

/// Operation kind tag for an account proposal.
pub const KIND_ACCOUNT_PROPOSAL: u8 = 110;
/// Curve tag for Ed25519 observer keys.
pub const CURVE_ED25519: u8 = 1;

/// A structured multisig account proposal, consumed by [`Operation::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// 128-bit identifier, doubling as the transaction trace.
    pub id: Uuid,
    pub kind: u8,
    pub curve: u8,
    pub public: Vec<u8>,
    pub extra: Vec<u8>,
}

impl Operation {
    /// Build an account proposal from a hex-encoded observer public key.
    pub fn account_proposal(id: Uuid, public_hex: &str, extra: Vec<u8>) -> Result<Self, EncodeError> {
        Ok(Self {
            id,
            kind: KIND_ACCOUNT_PROPOSAL,
            curve: CURVE_ED25519,
            public: hex::decode(public_hex)?,
            extra,
        })
    }

    /// Serialize the operation into its fixed binary layout.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        check_len("public key", &self.public)?;
        check_len("extra", &self.extra)?;

        let mut buf =
            BytesMut::with_capacity(16 + 2 + 1 + self.public.len() + 1 + self.extra.len());
        buf.put_slice(self.id.as_bytes());
        buf.put_u8(self.kind);
        buf.put_u8(self.curve);
        buf.put_u8(self.public.len() as u8);
        buf.put_slice(&self.public);
        buf.put_u8(self.extra.len() as u8);
        buf.put_slice(&self.extra);
        Ok(buf.to_vec())
    }

    /// Decode an operation back out of its binary layout.
    pub fn decode(payload: &[u8]) -> Result<Self, EncodeError> {
        let mut buf = payload;

        let id = take(&mut buf, 16, "id")?;
        let id = Uuid::from_slice(&id).map_err(|_| EncodeError::Truncated { field: "id" })?;
        if buf.remaining() < 2 {
            return Err(EncodeError::Truncated { field: "kind" });
        }
        let kind = buf.get_u8();
        let curve = buf.get_u8();
        let public = take_prefixed(&mut buf, "public key")?;
        let extra = take_prefixed(&mut buf, "extra")?;
        if buf.has_remaining() {
            return Err(EncodeError::TrailingBytes {
                len: buf.remaining(),
            });
        }

        Ok(Self {
            id,
            kind,
            curve,
            public,
            extra,
        })
    }
}

fn check_len(field: &'static str, value: &[u8]) -> Result<(), EncodeError> {
    if value.len() > u8::MAX as usize {
        return Err(EncodeError::FieldTooLong {
            field,
            len: value.len(),
        });
    }
    Ok(())
}

fn take(buf: &mut &[u8], len: usize, field: &'static str) -> Result<Vec<u8>, EncodeError> {
    if buf.remaining() < len {
        return Err(EncodeError::Truncated { field });
    }
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

fn take_prefixed(buf: &mut &[u8], field: &'static str) -> Result<Vec<u8>, EncodeError> {
    if !buf.has_remaining() {
        return Err(EncodeError::Truncated { field });
    }
    let len = buf.get_u8() as usize;
    take(buf, len, field)
}

/// Threshold-of-owners receiver set carried in a proposal's `extra` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigOwners {
    pub threshold: u8,
    pub owners: Vec<Uuid>,
}

impl MultisigOwners {
    pub fn new(threshold: u8, owners: Vec<Uuid>) -> Self {
        Self { threshold, owners }
    }

    /// Encode as `[threshold][total][owner UUIDs...]`.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let count = self.owners.len();
        if count == 0 || count > u8::MAX as usize {
            return Err(EncodeError::InvalidOwnerCount { count });
        }
        if self.threshold == 0 || self.threshold as usize > count {
            return Err(EncodeError::InvalidThreshold {
                threshold: self.threshold,
                count,
            });
        }

        let mut extra = Vec::with_capacity(2 + 16 * count);
        extra.push(self.threshold);
        extra.push(count as u8);
        for owner in &self.owners {
            extra.extend_from_slice(owner.as_bytes());
        }
        Ok(extra)
    }
}
