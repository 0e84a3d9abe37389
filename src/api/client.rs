//! reqwest-backed implementation of the API capabilities.
//!
//! Every response arrives in a `{data, error}` envelope; a populated
//! `error` member becomes [`ApiError::Remote`] so callers can classify
//! failure codes without touching HTTP details.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::api::auth::{PinCipher, RequestSigner};
use crate::api::{
    ApiError, Asset, Attachment, MixinApi, MultisigTransactionRequest, Transaction, Transfer,
    TransferRequest, User,
};
use crate::channels::Transport;
use crate::config::Config;
use crate::error::ChannelError;

/// Default REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.mixin.one";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Declared edge for outbound image attachments.
const ATTACHMENT_EDGE: u32 = 300;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: Option<RemoteError>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    description: String,
}

fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    if let Some(error) = envelope.error {
        return Err(ApiError::Remote {
            status: error.status,
            code: error.code,
            description: error.description,
        });
    }
    envelope.data.ok_or_else(|| {
        ApiError::Decode(<serde_json::Error as serde::de::Error>::custom(
            "envelope carries neither data nor error",
        ))
    })
}

/// Lookup helper: a remote not-found is an absent entity, not a failure.
fn optional<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_not_found() => Ok(None),
        Err(error) => Err(error),
    }
}

/// Authenticated client for the messenger REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
    pin_cipher: PinCipher,
    pin: SecretString,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, crate::error::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("trainbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            http,
            base_url: DEFAULT_API_BASE.to_string(),
            signer: RequestSigner::new(
                config.client_id.clone(),
                config.session_id.clone(),
                &config.private_key,
            )?,
            pin_cipher: PinCipher::new(&config.pin_token, &config.session_id)?,
            pin: config.pin.clone(),
        })
    }

    /// Override the REST endpoint, e.g. for a staging gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bearer token for an arbitrary signed request (also used by the
    /// websocket handshake).
    pub fn sign(&self, method: &str, path: &str, body: &[u8]) -> Result<String, ApiError> {
        Ok(self.signer.sign(method, path, body)?)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let payload = match &body {
            Some(value) => serde_json::to_vec(value)?,
            None => Vec::new(),
        };
        let token = self.signer.sign(method.as_str(), path, &payload)?;

        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token);
        if body.is_some() {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let bytes = request.send().await?.bytes().await?;
        decode_envelope(&bytes)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    fn sealed_pin(&self) -> Result<String, ApiError> {
        Ok(self.pin_cipher.seal(&self.pin)?)
    }

    /// Upload attachment bytes to their reserved storage slot.
    pub async fn upload_attachment(&self, upload_url: &str, data: &[u8]) -> Result<(), ApiError> {
        let response = self
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("x-amz-acl", "public-read")
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(ApiError::UploadRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn send_message(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        category: &str,
        data: &[u8],
    ) -> Result<(), ApiError> {
        let body = json!({
            "conversation_id": conversation_id,
            "recipient_id": recipient_id,
            "message_id": Uuid::new_v4(),
            "category": category,
            "data": STANDARD.encode(data),
        });
        let _: serde_json::Value = self.post("/messages", body).await?;
        Ok(())
    }
}

#[async_trait]
impl MixinApi for ApiClient {
    async fn lookup_user(&self, id: &str) -> Result<Option<User>, ApiError> {
        // Identity numbers resolve through the search endpoint, user ids
        // through the direct record.
        let path = if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            format!("/search/{}", urlencoding::encode(id))
        } else {
            format!("/users/{}", urlencoding::encode(id))
        };
        optional(self.get(&path).await)
    }

    async fn lookup_asset_by_id(&self, asset_id: Uuid) -> Result<Option<Asset>, ApiError> {
        optional(self.get(&format!("/network/assets/{asset_id}")).await)
    }

    async fn search_assets_by_symbol(&self, query: &str) -> Result<Vec<Asset>, ApiError> {
        self.get(&format!(
            "/network/assets/search/{}",
            urlencoding::encode(query)
        ))
        .await
    }

    async fn read_transfer_by_trace(&self, trace_id: Uuid) -> Result<Option<Transfer>, ApiError> {
        optional(self.get(&format!("/transfers/trace/{trace_id}")).await)
    }

    async fn create_transfer(&self, request: TransferRequest) -> Result<Transfer, ApiError> {
        let body = json!({
            "asset_id": request.asset_id,
            "opponent_id": request.opponent_id,
            "amount": request.amount.to_string(),
            "trace_id": request.trace_id,
            "memo": request.memo,
            "pin": self.sealed_pin()?,
        });
        self.post("/transfers", body).await
    }

    async fn create_multisig_transaction(
        &self,
        request: MultisigTransactionRequest,
    ) -> Result<Transaction, ApiError> {
        let body = json!({
            "asset_id": request.asset_id,
            "amount": request.amount.to_string(),
            "trace_id": request.trace_id,
            "memo": request.memo,
            "opponent_multisig": {
                "receivers": request.receivers,
                "threshold": request.threshold,
            },
            "pin": self.sealed_pin()?,
        });
        self.post("/transactions", body).await
    }

    async fn create_attachment(&self) -> Result<Attachment, ApiError> {
        self.post("/attachments", json!({})).await
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send_text(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        content: &str,
    ) -> Result<(), ChannelError> {
        self.send_message(conversation_id, recipient_id, "PLAIN_TEXT", content.as_bytes())
            .await?;
        Ok(())
    }

    async fn send_button(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        label: &str,
        action: &str,
        color: &str,
    ) -> Result<(), ChannelError> {
        let buttons = serde_json::to_vec(&json!([
            {"label": label, "action": action, "color": color}
        ]))
        .map_err(ApiError::Decode)?;
        self.send_message(conversation_id, recipient_id, "APP_BUTTON_GROUP", &buttons)
            .await?;
        Ok(())
    }

    async fn send_image(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<(), ChannelError> {
        let attachment = self.create_attachment().await?;
        self.upload_attachment(&attachment.upload_url, data).await?;

        let image = serde_json::to_vec(&json!({
            "attachment_id": attachment.attachment_id,
            "mime_type": mime_type,
            "width": ATTACHMENT_EDGE,
            "height": ATTACHMENT_EDGE,
            "size": data.len(),
        }))
        .map_err(ApiError::Decode)?;
        self.send_message(conversation_id, recipient_id, "PLAIN_IMAGE", &image)
            .await?;
        Ok(())
    }

    async fn send_code_block(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        json_block: &str,
    ) -> Result<(), ChannelError> {
        let content = format!("```json\n{json_block}\n```");
        self.send_message(conversation_id, recipient_id, "PLAIN_POST", content.as_bytes())
            .await?;
        Ok(())
    }

    async fn send_contact_card(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        user_id: &str,
    ) -> Result<(), ChannelError> {
        let card = serde_json::to_vec(&json!({"user_id": user_id})).map_err(ApiError::Decode)?;
        self.send_message(conversation_id, recipient_id, "PLAIN_CONTACT", &card)
            .await?;
        Ok(())
    }
}
