//! Feishu HTTP client module
//!
//! This module contains the FeishuClient, the FeishuBot facade and its builder.

mod feishu_client;
pub use feishu_client::{FeishuClient, FeishuClientBuilder};

mod feishu_bot;
pub use feishu_bot::FeishuBot;

mod builder;
pub use builder::FeishuBotBuilder;
