//! Feishu open API modules
//!
//! - [`contact`] - Resolve a recipient open_id from phone or email
//! - [`upload`] - Image and file uploads for the IM API
//! - [`message`] - Message content types and the send endpoint
//! - [`cover`] - First-frame extraction for video message covers

pub mod contact;
pub mod context;
pub mod cover;
pub mod message;
pub mod upload;

pub use contact::ContactApi;
pub use context::FeishuContext;
pub use cover::CoverExtractor;
pub use message::{
    CardContent, FileContent, ImageContent, MediaContent, MessageApi, MessageInfo, MsgType,
    TextContent,
};
pub use upload::{FileSource, FileType, UploadApi, UploadKind};
