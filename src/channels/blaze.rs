//! Blaze websocket channel.
//!
//! Inbound side of the bot:
//! 1. Connect to the gateway with a signed token and the `Mixin-Blaze-1`
//!    subprotocol.
//! 2. Send `LIST_PENDING_MESSAGES` so messages queued while offline drain
//!    first.
//! 3. Frames are gzip-compressed JSON envelopes. Each `CREATE_MESSAGE`
//!    is acknowledged as READ, classified, dispatched, and its response
//!    plan delivered through the REST transport.
//! 4. On any connection error: reconnect with exponential backoff.

use std::io::{Read as _, Write as _};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{Dispatcher, InboundMessage, MessageCategory};
use crate::api::ApiClient;
use crate::channels::deliver;
use crate::error::ChannelError;

/// Default websocket gateway.
pub const DEFAULT_GATEWAY_URL: &str = "wss://blaze.mixin.one";

const SUBPROTOCOL: &str = "Mixin-Blaze-1";
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Gateway frame envelope; every frame travels gzip-compressed.
#[derive(Debug, Serialize, Deserialize)]
struct BlazeFrame {
    id: Uuid,
    action: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    params: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    error: Option<FrameError>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FrameError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    description: String,
}

impl BlazeFrame {
    fn request(action: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.to_string(),
            params: None,
            data: None,
            error: None,
        }
    }

    fn ack(message_id: Uuid) -> Self {
        let mut frame = Self::request("ACKNOWLEDGE_MESSAGE_RECEIPT");
        frame.params = Some(json!({"message_id": message_id, "status": "READ"}));
        frame
    }
}

/// One delivered message, as carried in a `CREATE_MESSAGE` frame.
#[derive(Debug, Deserialize)]
struct MessageView {
    conversation_id: Uuid,
    user_id: String,
    message_id: Uuid,
    category: String,
    #[serde(default)]
    data: String,
}

/// The reconnecting gateway client.
pub struct BlazeChannel {
    gateway_url: String,
    client_id: String,
    api: Arc<ApiClient>,
    dispatcher: Dispatcher,
}

impl BlazeChannel {
    pub fn new(client_id: impl Into<String>, api: Arc<ApiClient>, dispatcher: Dispatcher) -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            client_id: client_id.into(),
            api,
            dispatcher,
        }
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    /// Serve forever, reconnecting with exponential backoff.
    pub async fn run(&self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            info!(url = %self.gateway_url, "gateway: connecting");
            match self.serve().await {
                Ok(()) => {
                    info!("gateway: connection closed, reconnecting");
                    backoff = INITIAL_BACKOFF;
                }
                Err(error) => {
                    warn!(%error, "gateway: connection failed");
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
            tokio::time::sleep(backoff).await;
        }
    }

    async fn serve(&self) -> Result<(), ChannelError> {
        let token = self
            .api
            .sign("GET", "/", b"")
            .map_err(|error| ChannelError::Rejected {
                reason: error.to_string(),
            })?;

        let mut request = self.gateway_url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            "Authorization",
            bearer_header(&token).map_err(|reason| ChannelError::Rejected { reason })?,
        );
        headers.insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));

        let (stream, _) = connect_async(request).await?;
        info!("gateway: connected");
        let (mut sink, mut source) = stream.split();

        sink.send(encode_frame(&BlazeFrame::request("LIST_PENDING_MESSAGES"))?)
            .await?;

        while let Some(message) = source.next().await {
            match message? {
                Message::Binary(payload) => {
                    if let Some(view) = accept_frame(&payload, &self.client_id)? {
                        sink.send(encode_frame(&BlazeFrame::ack(view.message_id))?)
                            .await?;
                        self.handle_message(view).await;
                    }
                }
                Message::Ping(payload) => sink.send(Message::Pong(payload)).await?,
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }

    async fn handle_message(&self, view: MessageView) {
        let payload = match STANDARD.decode(&view.data) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(message_id = %view.message_id, %error, "undecodable message payload");
                return;
            }
        };

        let inbound = InboundMessage::new(
            view.user_id.clone(),
            MessageCategory::from(view.category.as_str()),
            payload,
        );
        let plan = self.dispatcher.dispatch(&inbound).await;
        if plan.is_empty() {
            return;
        }
        deliver(
            self.api.as_ref(),
            view.conversation_id,
            &view.user_id,
            &plan,
        )
        .await;
    }
}

fn bearer_header(token: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| e.to_string())
}

/// Decode one gateway frame, returning the message view to process.
///
/// Management frames, error frames, and echoes of the bot's own outbound
/// messages yield `None`.
fn accept_frame(payload: &[u8], client_id: &str) -> Result<Option<MessageView>, ChannelError> {
    let frame = decode_frame(payload)?;

    if let Some(error) = frame.error {
        warn!(
            action = frame.action,
            code = error.code,
            description = error.description,
            "gateway error frame"
        );
        return Ok(None);
    }
    if frame.action != "CREATE_MESSAGE" {
        debug!(action = frame.action, "ignoring gateway frame");
        return Ok(None);
    }
    let Some(data) = frame.data else {
        return Ok(None);
    };
    let view: MessageView =
        serde_json::from_value(data).map_err(|e| ChannelError::InvalidFrame(e.to_string()))?;
    if view.user_id == client_id {
        return Ok(None);
    }
    Ok(Some(view))
}

fn encode_frame(frame: &BlazeFrame) -> Result<Message, ChannelError> {
    let raw =
        serde_json::to_vec(frame).map_err(|e| ChannelError::InvalidFrame(e.to_string()))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(Message::Binary(encoder.finish()?.into()))
}

fn decode_frame(payload: &[u8]) -> Result<BlazeFrame, ChannelError> {
    let mut raw = Vec::new();
    GzDecoder::new(payload).read_to_end(&mut raw)?;
    serde_json::from_slice(&raw).map_err(|e| ChannelError::InvalidFrame(e.to_string()))
}
