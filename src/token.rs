//! Tenant access token management for the Feishu API
//!
//! Caches a single token and refreshes it once it expires.

use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::FeishuClient;
use crate::error::FeishuError;
use crate::types::AccessToken;

pub(crate) const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

pub struct CachedToken {
    pub token: AccessToken,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub tenant_access_token: String,
    /// Lifetime in seconds
    #[serde(default)]
    pub expire: u64,
}

/// Manages the tenant access token lifecycle
pub struct TokenManager {
    client: FeishuClient,
    pub cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(client: FeishuClient) -> Self {
        Self {
            client,
            cache: Mutex::new(None),
        }
    }

    /// Return the cached token, refreshing it when absent or expired.
    pub async fn get_token(&self) -> Result<String, FeishuError> {
        let mut cache = self.cache.lock().await;

        if let Some(ref cached) = *cache {
            if !cached.is_expired() {
                return Ok(cached.token.as_str().to_string());
            }
        }

        let response = self.fetch_token().await?;

        let token = AccessToken::new(response.tenant_access_token).map_err(FeishuError::Token)?;
        debug!("[FeishuBot] tenant access token refreshed, expires in {}s", response.expire);

        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + Duration::from_secs(response.expire),
        });
        Ok(token.as_str().to_string())
    }

    async fn fetch_token(&self) -> Result<TokenResponse, FeishuError> {
        let body = TokenRequest {
            app_id: self.client.app_id(),
            app_secret: self.client.app_secret(),
        };

        self.client.post(TENANT_TOKEN_PATH, None, &[], &body).await
    }

    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        *cache = None;
    }
}
