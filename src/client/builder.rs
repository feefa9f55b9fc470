use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use reqwest::{Request as ReqwestRequest, Response as ReqwestResponse};
use tower::{Layer, Service};

use crate::api::contact::ContactApi;
use crate::api::cover::CoverExtractor;
use crate::api::FeishuContext;
use crate::config::FeishuConfig;
use crate::error::FeishuError;
use crate::token::TokenManager;
use crate::types::{AppId, AppSecret, OpenId};

use super::feishu_client::{
    FeishuClient, MiddlewareExecutor, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_TIMEOUT_SECS,
};
use super::FeishuBot;

#[must_use]
#[derive(Default)]
pub struct FeishuBotBuilder<M = ()> {
    config: Option<FeishuConfig>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    cover_extractor: Option<CoverExtractor>,
    middleware: Option<M>,
}

impl<M> std::fmt::Debug for FeishuBotBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuBotBuilder")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("cover_extractor", &self.cover_extractor)
            .field("middleware", &self.middleware.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

impl<M> FeishuBotBuilder<M> {
    /// Use this configuration instead of reading the environment.
    pub fn config(mut self, config: FeishuConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the API origin; takes precedence over `FeishuConfig::base_url`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the video cover capability. Defaults to probing `ffmpeg` on `PATH`.
    pub fn cover_extractor(mut self, extractor: CoverExtractor) -> Self {
        self.cover_extractor = Some(extractor);
        self
    }

    pub fn with_middleware<M2>(self, middleware: M2) -> FeishuBotBuilder<M2>
    where
        M2: Layer<FeishuClient> + Clone + Send + Sync + 'static,
    {
        FeishuBotBuilder {
            config: self.config,
            base_url: self.base_url,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            cover_extractor: self.cover_extractor,
            middleware: Some(middleware),
        }
    }

    /// Build the bot, resolving the recipient open_id if needed.
    ///
    /// An incomplete configuration yields a disabled bot, not an error.
    ///
    /// # Errors
    /// - `FeishuError::Config` for an invalid base URL, or when open_id must
    ///   be looked up but neither phone nor email is set
    /// - `FeishuError::Api` / `FeishuError::Lookup` if the lookup fails
    pub async fn build(self) -> Result<FeishuBot, FeishuError>
    where
        M: Layer<FeishuClient> + Clone + Send + Sync + 'static,
        M::Service: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <M::Service as Service<ReqwestRequest>>::Future: Send + 'static,
    {
        let config = self.config.unwrap_or_else(FeishuConfig::from_env);

        if !config.is_enabled() {
            warn!(
                "FEISHU_APP_ID={:?} or FEISHU_APP_SECRET is not set, or none of FEISHU_OPEN_ID, \
                 FEISHU_PHONE, FEISHU_EMAIL is set, feishu bot is unavailable.",
                config.app_id
            );
            return Ok(FeishuBot::disabled());
        }

        let app_id = AppId::new(config.app_id.clone().unwrap_or_default())
            .map_err(FeishuError::Config)?;
        let app_secret = AppSecret::new(config.app_secret.clone().unwrap_or_default())
            .map_err(FeishuError::Config)?;

        let base_url = self
            .base_url
            .or_else(|| config.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(FeishuError::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

        let mut client = FeishuClient::builder()
            .app_id(app_id)
            .app_secret(app_secret)
            .base_url(base_url)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        if let Some(middleware) = self.middleware {
            let service = middleware.layer(client.clone());
            let executor = make_middleware_executor(service);
            client = client.with_middleware_executor(executor);
        }

        let client_arc = Arc::new(client);
        let token_manager = Arc::new(TokenManager::new(FeishuClient::clone(&client_arc)));
        let context = Arc::new(FeishuContext::new(client_arc, token_manager));

        let open_id = match config.open_id {
            Some(open_id) => open_id,
            None => {
                ContactApi::new(context.clone())
                    .resolve_open_id(config.phone.as_deref(), config.email.as_deref())
                    .await?
            }
        };
        let open_id = OpenId::new(open_id).map_err(FeishuError::Config)?;

        let cover_extractor = match self.cover_extractor {
            Some(extractor) => extractor,
            None => CoverExtractor::detect().await,
        };

        Ok(FeishuBot::enabled(context, open_id, cover_extractor))
    }
}

fn make_middleware_executor<S>(service: S) -> MiddlewareExecutor
where
    S: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let service = Arc::new(service);

    Arc::new(move |request: ReqwestRequest| {
        let mut service = (*service).clone();
        Box::pin(async move { service.call(request).await })
            as Pin<Box<dyn Future<Output = Result<ReqwestResponse, reqwest::Error>> + Send>>
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn enabled_config() -> FeishuConfig {
        FeishuConfig::new("cli_test_app", "test_secret").with_open_id("ou_configured")
    }

    #[tokio::test]
    async fn test_build_with_open_id_makes_no_request() {
        let mock_server = MockServer::start().await;

        let bot = FeishuBot::builder()
            .config(enabled_config())
            .base_url(mock_server.uri())
            .cover_extractor(CoverExtractor::Unavailable)
            .build()
            .await
            .unwrap();

        assert!(bot.is_enabled());
        assert_eq!(bot.open_id(), Some("ou_configured"));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_incomplete_config_is_disabled() {
        let bot = FeishuBot::builder()
            .config(FeishuConfig::new("cli_test_app", "test_secret"))
            .build()
            .await
            .unwrap();

        assert!(!bot.is_enabled());
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_base_url() {
        let result = FeishuBot::builder()
            .config(enabled_config())
            .base_url("open.feishu.cn")
            .build()
            .await;

        assert!(matches!(result, Err(FeishuError::Config(_))));
    }

    #[tokio::test]
    async fn test_build_uses_config_base_url() {
        let mock_server = MockServer::start().await;

        let bot = FeishuBot::builder()
            .config(enabled_config().with_base_url(mock_server.uri()))
            .cover_extractor(CoverExtractor::Unavailable)
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(1))
            .build()
            .await
            .unwrap();

        assert!(bot.is_enabled());
    }

    #[tokio::test]
    async fn test_middleware_configured_and_executes() {
        #[derive(Clone)]
        struct FlagLayer {
            flag: Arc<AtomicBool>,
        }

        impl Layer<FeishuClient> for FlagLayer {
            type Service = FlagService;

            fn layer(&self, inner: FeishuClient) -> Self::Service {
                FlagService {
                    inner,
                    flag: Arc::clone(&self.flag),
                }
            }
        }

        #[derive(Clone)]
        struct FlagService {
            inner: FeishuClient,
            flag: Arc<AtomicBool>,
        }

        impl Service<ReqwestRequest> for FlagService {
            type Response = ReqwestResponse;
            type Error = reqwest::Error;
            type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, req: ReqwestRequest) -> Self::Future {
                self.flag.store(true, Ordering::SeqCst);
                let mut inner = self.inner.clone();
                Box::pin(async move { inner.call(req).await })
            }
        }

        let middleware_invoked = Arc::new(AtomicBool::new(false));
        let layer = FlagLayer {
            flag: Arc::clone(&middleware_invoked),
        };

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": "t-test",
                "expire": 7200
            })))
            .mount(&mock_server)
            .await;

        let bot = FeishuBot::builder()
            .config(enabled_config())
            .base_url(mock_server.uri())
            .cover_extractor(CoverExtractor::Unavailable)
            .with_middleware(layer)
            .build()
            .await
            .unwrap();

        assert_eq!(bot.access_token().await.unwrap(), "t-test");
        assert!(middleware_invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_builder_with_logging_middleware_builds() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": "t-test",
                "expire": 7200
            })))
            .mount(&mock_server)
            .await;

        let bot = FeishuBot::builder()
            .config(enabled_config())
            .base_url(mock_server.uri())
            .cover_extractor(CoverExtractor::Unavailable)
            .with_middleware(crate::middleware::LoggingMiddleware::new())
            .build()
            .await
            .unwrap();

        assert!(bot.access_token().await.is_ok());
    }
}
