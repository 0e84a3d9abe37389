//! Request tokens and PIN sealing.
//!
//! Both seams keep key material out of the rest of the crate: the
//! [`RequestSigner`] turns a (method, path, body) triple into a bearer
//! token, and the [`PinCipher`] seals the account PIN for transfer
//! endpoints. The dispatcher and client code never see raw secrets.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::Utc;
use ed25519_dalek::{Signer as _, SigningKey};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AuthError;

/// Token lifetime; long enough for clock skew, short enough to expire.
const TOKEN_TTL_SECS: i64 = 30 * 60;

#[derive(Serialize)]
struct Claims<'a> {
    uid: &'a str,
    sid: &'a str,
    iat: i64,
    exp: i64,
    jti: Uuid,
    sig: String,
    scp: &'static str,
}

/// Signs API requests with the session's Ed25519 key.
#[derive(Debug)]
pub struct RequestSigner {
    client_id: String,
    session_id: String,
    key: SigningKey,
}

impl RequestSigner {
    pub fn new(
        client_id: impl Into<String>,
        session_id: impl Into<String>,
        private_key: &SecretString,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client_id: client_id.into(),
            session_id: session_id.into(),
            key: decode_signing_key(private_key)?,
        })
    }

    /// Produce a bearer token authorizing one request.
    ///
    /// The token is an EdDSA JWT whose `sig` claim commits to
    /// `SHA256(method || path || body)`.
    pub fn sign(&self, method: &str, path: &str, body: &[u8]) -> Result<String, AuthError> {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(path.as_bytes());
        hasher.update(body);
        let request_sig = hex::encode(hasher.finalize());

        let now = Utc::now().timestamp();
        let claims = Claims {
            uid: &self.client_id,
            sid: &self.session_id,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            jti: Uuid::new_v4(),
            sig: request_sig,
            scp: "FULL",
        };

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.key.sign(signing_input.as_bytes()).to_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    #[cfg(test)]
    fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.key.verifying_key()
    }
}

fn decode_signing_key(private_key: &SecretString) -> Result<SigningKey, AuthError> {
    let raw = decode_base64(private_key.expose_secret())?;
    match raw.len() {
        32 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&raw);
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let mut pair = [0u8; 64];
            pair.copy_from_slice(&raw);
            SigningKey::from_keypair_bytes(&pair).map_err(|_| AuthError::KeyMismatch)
        }
        len => Err(AuthError::KeyLength { len }),
    }
}

fn decode_base64(value: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .or_else(|_| STANDARD.decode(value))
        .map_err(AuthError::from)
}

/// Seals the account PIN for transfer and transaction endpoints.
#[derive(Debug)]
pub struct PinCipher {
    key: [u8; 32],
}

impl PinCipher {
    /// Derive the sealing key from the session's PIN token.
    pub fn new(pin_token: &SecretString, session_id: &str) -> Result<Self, AuthError> {
        let token = decode_base64(pin_token.expose_secret())?;
        if token.len() < 16 {
            return Err(AuthError::PinTokenLength { len: token.len() });
        }

        let hkdf = Hkdf::<Sha256>::new(Some(session_id.as_bytes()), &token);
        let mut key = [0u8; 32];
        hkdf.expand(b"trainbot-pin-seal", &mut key)
            .map_err(|_| AuthError::Seal)?;
        Ok(Self { key })
    }

    /// Seal the PIN under a fresh nonce; output is `base64(nonce || ct)`.
    pub fn seal(&self, pin: &SecretString) -> Result<String, AuthError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| AuthError::Seal)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, pin.expose_secret().as_bytes())
            .map_err(|_| AuthError::Seal)?;

        let mut sealed = Vec::with_capacity(nonce.len() + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }
}
