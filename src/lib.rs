//! Feishu (Lark) bot SDK for Rust
//!
//! Sends text, image, file, audio, video and card messages to one Feishu
//! user on behalf of an internal app.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feishu_bot_sdk::{FeishuBot, FeishuConfig};
//! use feishu_bot_sdk::api::FileType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // FEISHU_APP_ID, FEISHU_APP_SECRET and one of
//!     // FEISHU_OPEN_ID / FEISHU_PHONE / FEISHU_EMAIL
//!     let bot = FeishuBot::builder()
//!         .config(FeishuConfig::from_env())
//!         .build()
//!         .await?;
//!
//!     bot.send_text("hello").await?;
//!     bot.send_file(std::path::Path::new("report.pdf"), FileType::Pdf, None).await?;
//!     bot.send_card("**build passed**", Some("CI")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Disabled mode
//!
//! Without credentials and a recipient the bot is built *disabled*: every
//! operation logs a warning and returns an empty result, so call sites do
//! not need to check whether notifications are configured.
//!
//! ## Modules
//!
//! - [`api`] - Contact lookup, uploads, message content and sending
//! - [`client`] - HTTP client and the [`FeishuBot`] facade
//! - [`config`] - Environment configuration
//! - [`error`] - Error types
//! - [`middleware`] - Tower middleware (request logging)
//! - [`token`] - Tenant access token caching
//! - [`types`] - Identifier newtypes and the response envelope
//!
//! ## Error Handling
//!
//! ```rust,ignore
//! use feishu_bot_sdk::FeishuError;
//!
//! match bot.send_text("hi").await {
//!     Ok(info) => println!("sent {:?}", info.message_id),
//!     Err(FeishuError::Api { code, message }) => eprintln!("API error {code}: {message}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod token;
pub mod types;

pub use client::{FeishuBot, FeishuBotBuilder, FeishuClient, FeishuClientBuilder};
pub use config::FeishuConfig;
pub use error::FeishuError;
