//! Outbound transport and response-plan delivery.
//!
//! A [`ResponsePlan`] is executed action by action, in order. Each action
//! is independently fallible: a failed send is logged and the remaining
//! actions still run, so a broken image upload never suppresses the text
//! that precedes or follows it.

pub mod blaze;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::agent::plan::{OutboundAction, ResponsePlan};
use crate::error::ChannelError;

/// Outbound message capabilities of the transport layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        content: &str,
    ) -> Result<(), ChannelError>;

    async fn send_button(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        label: &str,
        action: &str,
        color: &str,
    ) -> Result<(), ChannelError>;

    async fn send_image(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<(), ChannelError>;

    async fn send_code_block(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        json_block: &str,
    ) -> Result<(), ChannelError>;

    async fn send_contact_card(
        &self,
        conversation_id: Uuid,
        recipient_id: &str,
        user_id: &str,
    ) -> Result<(), ChannelError>;
}

/// Execute a response plan over `transport`, in order.
pub async fn deliver(
    transport: &dyn Transport,
    conversation_id: Uuid,
    recipient_id: &str,
    plan: &ResponsePlan,
) {
    for action in plan.actions() {
        let result = match action {
            OutboundAction::SendText { content } => {
                transport
                    .send_text(conversation_id, recipient_id, content)
                    .await
            }
            OutboundAction::SendButton {
                label,
                action,
                color,
            } => {
                transport
                    .send_button(conversation_id, recipient_id, label, action, color)
                    .await
            }
            OutboundAction::SendImage { data, mime_type } => {
                transport
                    .send_image(conversation_id, recipient_id, data, mime_type)
                    .await
            }
            OutboundAction::SendCodeBlock { json } => {
                transport
                    .send_code_block(conversation_id, recipient_id, json)
                    .await
            }
            OutboundAction::SendContactCard { user_id } => {
                transport
                    .send_contact_card(conversation_id, recipient_id, user_id)
                    .await
            }
        };

        if let Err(error) = result {
            warn!(
                kind = action.kind(),
                %conversation_id,
                recipient_id,
                %error,
                "outbound action failed"
            );
        }
    }
}
