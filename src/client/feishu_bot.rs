//! Unified Feishu bot client

use std::future::Future;
use std::sync::Arc;

use log::warn;
use serde::Serialize;

use crate::api::cover::CoverExtractor;
use crate::api::message::{
    CardContent, FileContent, ImageContent, MediaContent, MessageApi, MessageInfo, MsgType,
    TextContent,
};
use crate::api::upload::{FileSource, FileType, UploadApi, UploadKind};
use crate::api::FeishuContext;
use crate::error::FeishuError;
use crate::types::OpenId;

/// Feishu bot that messages a single recipient
///
/// This is the main entry point for the SDK. A bot built from an incomplete
/// configuration is *disabled*: every operation logs a warning and returns
/// an empty result without touching the network.
///
/// # Example
///
/// ```rust,ignore
/// use feishu_bot_sdk::{FeishuBot, FeishuConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let bot = FeishuBot::builder()
///         .config(FeishuConfig::from_env())
///         .build()
///         .await?;
///
///     bot.send_text("deploy finished").await?;
///     bot.send_card("**all green**", Some("CI")).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FeishuBot {
    state: BotState,
}

#[derive(Clone)]
enum BotState {
    Enabled(Arc<LiveBot>),
    Disabled,
}

struct LiveBot {
    context: Arc<FeishuContext>,
    open_id: OpenId,
    cover_extractor: CoverExtractor,
}

impl std::fmt::Debug for FeishuBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            BotState::Enabled(bot) => f
                .debug_struct("FeishuBot")
                .field("open_id", &bot.open_id)
                .field("cover_extractor", &bot.cover_extractor)
                .finish_non_exhaustive(),
            BotState::Disabled => f.write_str("FeishuBot(disabled)"),
        }
    }
}

impl FeishuBot {
    pub fn builder() -> super::builder::FeishuBotBuilder {
        super::builder::FeishuBotBuilder::default()
    }

    /// Build a bot from the `FEISHU_*` environment variables.
    pub async fn from_env() -> Result<Self, FeishuError> {
        Self::builder().build().await
    }

    pub(crate) fn enabled(
        context: Arc<FeishuContext>,
        open_id: OpenId,
        cover_extractor: CoverExtractor,
    ) -> Self {
        Self {
            state: BotState::Enabled(Arc::new(LiveBot {
                context,
                open_id,
                cover_extractor,
            })),
        }
    }

    /// A bot on which every operation is a logged no-op.
    pub fn disabled() -> Self {
        Self {
            state: BotState::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, BotState::Enabled(_))
    }

    /// The resolved recipient, `None` when disabled.
    pub fn open_id(&self) -> Option<&str> {
        match &self.state {
            BotState::Enabled(bot) => Some(bot.open_id.as_str()),
            BotState::Disabled => None,
        }
    }

    /// Every public operation passes through here.
    async fn gated<'a, T, F, Fut>(&'a self, operation: &'static str, call: F) -> Result<T, FeishuError>
    where
        T: Default,
        F: FnOnce(&'a LiveBot) -> Fut,
        Fut: Future<Output = Result<T, FeishuError>>,
    {
        match &self.state {
            BotState::Enabled(bot) => call(bot.as_ref()).await,
            BotState::Disabled => {
                warn!("FeishuBot is disabled, {} is unavailable.", operation);
                Ok(T::default())
            }
        }
    }

    /// Current tenant access token; empty when disabled.
    pub async fn access_token(&self) -> Result<String, FeishuError> {
        self.gated("access_token", |bot| bot.context.token_manager.get_token())
            .await
    }

    /// Drop the cached tenant access token.
    pub async fn invalidate_token(&self) -> Result<(), FeishuError> {
        self.gated("invalidate_token", |bot| async move {
            bot.context.token_manager.invalidate().await;
            Ok(())
        })
        .await
    }

    /// Upload binary content, returning its `image_key` or `file_key`.
    pub async fn upload(
        &self,
        kind: UploadKind,
        source: impl Into<FileSource>,
        filename: Option<&str>,
    ) -> Result<String, FeishuError> {
        let source = source.into();
        self.gated("upload", |bot| bot.upload(kind, source, filename))
            .await
    }

    /// Send arbitrary content of the given `msg_type` to the recipient.
    pub async fn send_message<C: Serialize + ?Sized>(
        &self,
        msg_type: MsgType,
        content: &C,
    ) -> Result<MessageInfo, FeishuError> {
        self.gated("send_message", |bot| bot.send(msg_type, content))
            .await
    }

    /// Send a text message.
    pub async fn send_text(&self, msg: &str) -> Result<MessageInfo, FeishuError> {
        let content = TextContent::new(msg);
        self.gated("send_text", |bot| bot.send(MsgType::Text, &content))
            .await
    }

    /// Send an image message.
    ///
    /// The image is uploaded first; pass a path or raw bytes.
    pub async fn send_image(
        &self,
        image: impl Into<FileSource>,
    ) -> Result<MessageInfo, FeishuError> {
        let image = image.into();
        self.gated("send_image", |bot| bot.send_image(image)).await
    }

    /// Send a file message.
    ///
    /// `filename` defaults to the path's basename, or `"file"` for raw bytes.
    pub async fn send_file(
        &self,
        file: impl Into<FileSource>,
        file_type: FileType,
        filename: Option<&str>,
    ) -> Result<MessageInfo, FeishuError> {
        let file = file.into();
        self.gated("send_file", |bot| bot.send_file(file, file_type, filename))
            .await
    }

    /// Send an audio message. The audio must be opus; convert other formats
    /// first, e.g.:
    ///
    /// `ffmpeg -i SourceFile.mp3 -acodec libopus -ac 1 -ar 16000 TargetFile.opus`
    pub async fn send_audio(
        &self,
        audio: impl Into<FileSource>,
    ) -> Result<MessageInfo, FeishuError> {
        let audio = audio.into();
        self.gated("send_audio", |bot| bot.send_audio(audio)).await
    }

    /// Send an mp4 video message.
    ///
    /// Without a `cover`, the first frame of the video is used. That needs a
    /// path source and a working ffmpeg; when ffmpeg is missing this logs a
    /// warning and returns an empty result.
    pub async fn send_media(
        &self,
        media: impl Into<FileSource>,
        cover: Option<FileSource>,
    ) -> Result<MessageInfo, FeishuError> {
        let media = media.into();
        self.gated("send_media", |bot| bot.send_media(media, cover))
            .await
    }

    /// Send a card message whose body is markdown.
    pub async fn send_card(
        &self,
        message: &str,
        header: Option<&str>,
    ) -> Result<MessageInfo, FeishuError> {
        let mut card = CardContent::markdown(message);
        if let Some(header) = header {
            card = card.with_header(header);
        }
        self.gated("send_card", |bot| async move {
            bot.send(MsgType::Interactive, &card).await
        })
        .await
    }
}

impl LiveBot {
    async fn upload(
        &self,
        kind: UploadKind,
        source: FileSource,
        filename: Option<&str>,
    ) -> Result<String, FeishuError> {
        UploadApi::new(self.context.clone())
            .upload(kind, source, filename)
            .await
    }

    async fn send<C: Serialize + ?Sized>(
        &self,
        msg_type: MsgType,
        content: &C,
    ) -> Result<MessageInfo, FeishuError> {
        MessageApi::new(self.context.clone())
            .send(self.open_id.as_str(), msg_type, content)
            .await
    }

    async fn send_image(&self, image: FileSource) -> Result<MessageInfo, FeishuError> {
        let image_key = self.upload(UploadKind::Image, image, None).await?;
        self.send(MsgType::Image, &ImageContent { image_key }).await
    }

    async fn send_file(
        &self,
        file: FileSource,
        file_type: FileType,
        filename: Option<&str>,
    ) -> Result<MessageInfo, FeishuError> {
        let file_key = self
            .upload(UploadKind::File(file_type), file, filename)
            .await?;
        self.send(MsgType::File, &FileContent { file_key }).await
    }

    async fn send_audio(&self, audio: FileSource) -> Result<MessageInfo, FeishuError> {
        let file_key = self
            .upload(UploadKind::File(FileType::Opus), audio, None)
            .await?;
        self.send(MsgType::Audio, &FileContent { file_key }).await
    }

    async fn send_media(
        &self,
        media: FileSource,
        cover: Option<FileSource>,
    ) -> Result<MessageInfo, FeishuError> {
        let cover = match cover.filter(|cover| !cover.is_empty()) {
            Some(cover) => cover,
            None => {
                if !self.cover_extractor.is_available() {
                    warn!("ffmpeg is not installed, send_media without a cover is unavailable");
                    return Ok(MessageInfo::default());
                }
                let path = media.path().ok_or_else(|| {
                    FeishuError::Config(
                        "cover must be set when media is not a file path".to_string(),
                    )
                })?;
                FileSource::Bytes(self.cover_extractor.extract_first_frame(path).await?)
            }
        };

        let file_key = self
            .upload(UploadKind::File(FileType::Mp4), media, None)
            .await?;
        let image_key = self.upload(UploadKind::Image, cover, None).await?;
        self.send(MsgType::Media, &MediaContent { file_key, image_key })
            .await
    }
}
