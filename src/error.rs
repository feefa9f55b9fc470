use thiserror::Error;

/// Feishu SDK error types
#[derive(Debug, Error)]
pub enum FeishuError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response envelope carried a nonzero `code`.
    #[error("Message failed: {message}")]
    Api { code: i64, message: String },

    #[error("Access token error: {0}")]
    Token(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query open_id failed: {0}")]
    Lookup(String),

    #[error("Cover extraction failed: {0}")]
    Cover(String),
}

impl FeishuError {
    /// Turn a nonzero envelope code into [`FeishuError::Api`].
    pub fn check_api(code: i64, msg: &str) -> Result<(), FeishuError> {
        if code != 0 {
            return Err(FeishuError::Api {
                code,
                message: msg.to_string(),
            });
        }
        Ok(())
    }
}
