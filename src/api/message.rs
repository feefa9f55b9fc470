//! IM Message API
//!
//! Sends messages to a single open_id.
//!
//! POST /open-apis/im/v1/messages?receive_id_type=open_id
//!
//! The request carries `{receive_id, msg_type, content}` where `content` is
//! the kind-specific payload serialized to a JSON *string*.
//!
//! # Example
//!
//! ```rust
//! use feishu_bot_sdk::api::message::{CardContent, TextContent};
//!
//! let text = serde_json::to_value(TextContent::new("hello")).unwrap();
//! assert_eq!(text, serde_json::json!({"text": "hello"}));
//!
//! let card = serde_json::to_value(CardContent::markdown("**b**").with_header("H")).unwrap();
//! assert_eq!(card["header"]["title"]["content"], "H");
//! ```

use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use super::FeishuContext;
use crate::error::FeishuError;
use crate::types::ApiResponse;

pub(crate) const MESSAGE_PATH: &str = "/open-apis/im/v1/messages";

/// `msg_type` of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MsgType {
    Text,
    Image,
    Audio,
    Media,
    File,
    /// Card message
    Interactive,
}

impl MsgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MsgType::Text => "text",
            MsgType::Image => "image",
            MsgType::Audio => "audio",
            MsgType::Media => "media",
            MsgType::File => "file",
            MsgType::Interactive => "interactive",
        }
    }
}

// ============================================================================
// Content Types
// ============================================================================

/// Plain text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Image content, referencing an uploaded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageContent {
    pub image_key: String,
}

/// File or audio content, referencing an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub file_key: String,
}

/// Video content: the uploaded mp4 plus its cover image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaContent {
    pub file_key: String,
    pub image_key: String,
}

/// Interactive card with a single markdown element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardContent {
    config: CardConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<CardHeader>,
    elements: Vec<CardElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CardConfig {
    wide_screen_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CardHeader {
    title: CardText,
    template: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CardText {
    tag: &'static str,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CardElement {
    tag: &'static str,
    content: String,
}

impl CardContent {
    /// Build a wide-screen card whose body is `message` rendered as markdown.
    pub fn markdown(message: impl Into<String>) -> Self {
        Self {
            config: CardConfig {
                wide_screen_mode: true,
            },
            header: None,
            elements: vec![CardElement {
                tag: "markdown",
                content: message.into(),
            }],
        }
    }

    /// Add a blue plain-text header. An empty header is ignored.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        if !header.is_empty() {
            self.header = Some(CardHeader {
                title: CardText {
                    tag: "plain_text",
                    content: header,
                },
                template: "blue",
            });
        }
        self
    }
}

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    receive_id: &'a str,
    msg_type: MsgType,
    content: String,
}

/// The `data` of a successful send.
///
/// `MessageInfo::default()` is the empty result returned by no-op operations.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageInfo {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}

impl MessageInfo {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub struct MessageApi {
    context: Arc<FeishuContext>,
}

impl MessageApi {
    pub fn new(context: Arc<FeishuContext>) -> Self {
        Self { context }
    }

    /// Send a message to the given open_id.
    ///
    /// # Errors
    /// Returns `FeishuError::Api` if the envelope `code` is nonzero
    pub async fn send<C: Serialize + ?Sized>(
        &self,
        receive_id: &str,
        msg_type: MsgType,
        content: &C,
    ) -> Result<MessageInfo, FeishuError> {
        let body = SendMessageRequest {
            receive_id,
            msg_type,
            content: serde_json::to_string(content)?,
        };

        let token = self.context.token_manager.get_token().await?;
        let response: ApiResponse<MessageInfo> = self
            .context
            .client
            .post(
                MESSAGE_PATH,
                Some(&token),
                &[("receive_id_type", "open_id")],
                &body,
            )
            .await?;

        let info = response.data.unwrap_or_default();
        info!(
            "[FeishuBot] sent {} message, message_id: {:?}",
            msg_type.as_str(),
            info.message_id
        );
        Ok(info)
    }
}
