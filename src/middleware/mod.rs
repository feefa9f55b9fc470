//! Middleware components for the Feishu SDK.
//!
//! Middleware wraps the HTTP client as a Tower [`Layer`] and is installed with
//! [`FeishuBotBuilder::with_middleware`](crate::client::FeishuBotBuilder::with_middleware).
//!
//! - [`LoggingMiddleware`] - Logs request/response information with secrets redacted
//!
//! ## Usage
//!
//! ```ignore
//! use feishu_bot_sdk::{FeishuBot, middleware::LoggingMiddleware};
//!
//! let bot = FeishuBot::builder()
//!     .with_middleware(LoggingMiddleware::new().verbose())
//!     .build()
//!     .await?;
//! ```

// Re-export tower types for convenience
pub use tower::{Layer, Service};

mod logging;

pub use logging::LoggingMiddleware;
