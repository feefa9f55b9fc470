//! Feishu HTTP Client
//!
//! Provides the HTTP client wrapper that every Feishu API call goes through.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

use crate::error::FeishuError;
use crate::types::{AppId, AppSecret};

pub(crate) const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

type MiddlewareFuture =
    Pin<Box<dyn Future<Output = Result<reqwest::Response, reqwest::Error>> + Send>>;
pub(crate) type MiddlewareExecutor =
    Arc<dyn Fn(reqwest::Request) -> MiddlewareFuture + Send + Sync>;

/// Feishu API Client
///
/// Reusable HTTP client for calling Feishu open APIs.
/// Built with reqwest for async HTTP requests.
#[derive(Clone)]
pub struct FeishuClient {
    http: Client,
    app_id: AppId,
    app_secret: AppSecret,
    base_url: String,
    middleware_executor: Option<MiddlewareExecutor>,
}

impl std::fmt::Debug for FeishuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuClient")
            .field("app_id", &self.app_id)
            .field("base_url", &self.base_url)
            .field(
                "middleware_executor",
                &self.middleware_executor.as_ref().map(|_| ".."),
            )
            .finish_non_exhaustive()
    }
}

impl FeishuClient {
    /// Create a new client builder
    pub fn builder() -> FeishuClientBuilder {
        FeishuClientBuilder::default()
    }

    /// Get the app id
    pub fn app_id(&self) -> &str {
        self.app_id.as_str()
    }

    pub(crate) fn app_secret(&self) -> &str {
        self.app_secret.as_str()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying [`reqwest::Client`] for raw HTTP requests.
    ///
    /// Note: requests made through this client bypass the middleware pipeline.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn with_middleware_executor(mut self, executor: MiddlewareExecutor) -> Self {
        self.middleware_executor = Some(executor);
        self
    }

    pub(crate) async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, reqwest::Error> {
        if let Some(executor) = &self.middleware_executor {
            (executor)(request).await
        } else {
            self.http.execute(request).await
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<T, FeishuError> {
        let response = self.send_request(request).await?;
        let status_error = response.error_for_status_ref().err();

        let bytes = response.bytes().await?;
        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            // A non-2xx reply without an envelope is a transport failure.
            Err(e) => {
                return Err(match status_error {
                    Some(http_error) => FeishuError::from(http_error),
                    None => FeishuError::from(e),
                });
            }
        };

        if let Some(code) = value.get("code").and_then(|v| v.as_i64()) {
            let msg = value
                .get("msg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            FeishuError::check_api(code, msg)?;
        }

        if let Some(http_error) = status_error {
            return Err(http_error.into());
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Make a JSON POST request to a Feishu API
    ///
    /// # Arguments
    /// * `path` - API endpoint path (e.g., "/open-apis/im/v1/messages")
    /// * `token` - Tenant access token sent as `Authorization: Bearer ...`
    /// * `query` - Query parameters as key-value pairs
    /// * `body` - Request body to serialize as JSON
    ///
    /// # Errors
    /// - Returns `FeishuError::Api` when the envelope `code` is nonzero
    /// - Returns `FeishuError::Http` for transport failures or non-2xx statuses
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, FeishuError> {
        let builder = self
            .http
            .post(self.url(path))
            .query(query)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(body);
        let request = Self::authorize(builder, token).build()?;
        self.execute(request).await
    }

    /// Make a multipart POST request to a Feishu API
    ///
    /// The multipart boundary sets its own content type.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        form: reqwest::multipart::Form,
    ) -> Result<T, FeishuError> {
        let builder = self.http.post(self.url(path)).multipart(form);
        let request = Self::authorize(builder, token).build()?;
        self.execute(request).await
    }
}

impl Service<reqwest::Request> for FeishuClient {
    type Response = reqwest::Response;
    type Error = reqwest::Error;
    type Future = MiddlewareFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        let client = self.http.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

/// Builder for FeishuClient
///
/// # Example
///
/// ```rust
/// use feishu_bot_sdk::client::FeishuClient;
/// use feishu_bot_sdk::types::{AppId, AppSecret};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = FeishuClient::builder()
///         .app_id(AppId::new("cli_a1b2c3d4e5f6")?)
///         .app_secret(AppSecret::new("app_secret_value")?)
///         .build()?;
///     assert_eq!(client.base_url(), "https://open.feishu.cn");
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct FeishuClientBuilder {
    app_id: Option<AppId>,
    app_secret: Option<AppSecret>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl FeishuClientBuilder {
    /// Set the Feishu app id
    pub fn app_id(mut self, app_id: AppId) -> Self {
        self.app_id = Some(app_id);
        self
    }

    /// Set the Feishu app secret
    pub fn app_secret(mut self, app_secret: AppSecret) -> Self {
        self.app_secret = Some(app_secret);
        self
    }

    /// Set the base URL for API calls
    ///
    /// Default: `<https://open.feishu.cn>`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the total timeout for requests
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the FeishuClient
    ///
    /// # Errors
    /// Returns an error if app id or app secret is not set
    pub fn build(self) -> Result<FeishuClient, FeishuError> {
        let app_id = self
            .app_id
            .ok_or_else(|| FeishuError::Config("app_id is required".to_string()))?;
        let app_secret = self
            .app_secret
            .ok_or_else(|| FeishuError::Config("app_secret is required".to_string()))?;

        let base_url = self
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(FeishuClient {
            http: client,
            app_id,
            app_secret,
            base_url,
            middleware_executor: None,
        })
    }
}
