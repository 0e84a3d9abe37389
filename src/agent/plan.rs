//! Response plans.
//!
//! The dispatcher never sends anything itself; it returns an ordered
//! [`ResponsePlan`] that the channel layer executes action by action.
//! Keeping the plan as plain data makes every dispatch decision assertable
//! in tests without a transport.

/// One outbound action.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundAction {
    SendText {
        content: String,
    },
    SendButton {
        label: String,
        action: String,
        color: String,
    },
    SendImage {
        data: Vec<u8>,
        mime_type: String,
    },
    /// A fenced JSON block rendered as a rich post.
    SendCodeBlock {
        json: String,
    },
    SendContactCard {
        user_id: String,
    },
}

impl OutboundAction {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SendText { .. } => "text",
            Self::SendButton { .. } => "button",
            Self::SendImage { .. } => "image",
            Self::SendCodeBlock { .. } => "code_block",
            Self::SendContactCard { .. } => "contact_card",
        }
    }
}

/// Ordered sequence of outbound actions for a single inbound event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponsePlan {
    actions: Vec<OutboundAction>,
}

impl ResponsePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plan consisting of a single text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new().with_text(content)
    }

    pub fn with_text(mut self, content: impl Into<String>) -> Self {
        self.actions.push(OutboundAction::SendText {
            content: content.into(),
        });
        self
    }

    pub fn with_button(
        mut self,
        label: impl Into<String>,
        action: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        self.actions.push(OutboundAction::SendButton {
            label: label.into(),
            action: action.into(),
            color: color.into(),
        });
        self
    }

    pub fn with_image(mut self, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        self.actions.push(OutboundAction::SendImage {
            data,
            mime_type: mime_type.into(),
        });
        self
    }

    pub fn with_code_block(mut self, json: impl Into<String>) -> Self {
        self.actions
            .push(OutboundAction::SendCodeBlock { json: json.into() });
        self
    }

    pub fn with_contact_card(mut self, user_id: impl Into<String>) -> Self {
        self.actions.push(OutboundAction::SendContactCard {
            user_id: user_id.into(),
        });
        self
    }

    pub fn actions(&self) -> &[OutboundAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl IntoIterator for ResponsePlan {
    type Item = OutboundAction;
    type IntoIter = std::vec::IntoIter<OutboundAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
