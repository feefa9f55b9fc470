use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use log::{debug, info};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Request, Response};
use tower::{Layer, Service};

#[derive(Clone)]
pub struct LoggingMiddleware {
    verbose: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for LoggingMiddleware
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Service = LoggingMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddlewareService {
            inner,
            verbose: self.verbose,
        }
    }
}

#[derive(Clone)]
pub struct LoggingMiddlewareService<S> {
    inner: S,
    verbose: bool,
}

impl<S> LoggingMiddlewareService<S> {
    /// Method, URL and headers of interest. The bearer token is never printed.
    fn describe_request(req: &Request) -> String {
        let auth = if req.headers().contains_key(AUTHORIZATION) {
            "Bearer [REDACTED]"
        } else {
            "none"
        };
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        format!(
            "{} {} auth={} content-type={}",
            req.method(),
            req.url(),
            auth,
            content_type
        )
    }
}

impl<S, Error> Service<Request> for LoggingMiddlewareService<S>
where
    S: Service<Request, Response = Response, Error = Error> + Send + Clone + 'static,
    S::Future: Send,
    Error: Send + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let line = Self::describe_request(&req);
        let verbose = self.verbose;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if verbose {
                debug!("[FeishuBot] >>> {}", line);
            } else {
                info!("[FeishuBot] {} {}", req.method(), req.url().path());
            }

            let start = Instant::now();
            let response = inner.call(req).await?;
            let duration = start.elapsed();

            if verbose {
                debug!("[FeishuBot] <<< {} ({:?})", response.status(), duration);
            } else {
                info!("[FeishuBot] {} ({:?})", response.status().as_u16(), duration);
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_describe_request_hides_bearer_token() {
        let req = Client::new()
            .post("https://open.feishu.cn/open-apis/im/v1/messages?receive_id_type=open_id")
            .bearer_auth("t-secret-token")
            .json(&serde_json::json!({}))
            .build()
            .unwrap();

        let detail = LoggingMiddlewareService::<()>::describe_request(&req);
        assert!(detail.starts_with(
            "POST https://open.feishu.cn/open-apis/im/v1/messages?receive_id_type=open_id "
        ));
        assert!(detail.contains("Bearer [REDACTED]"));
        assert!(detail.contains("application/json"));
        assert!(!detail.contains("t-secret-token"));
    }

    #[tokio::test]
    async fn test_logging_middleware_passes_response_through() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/open-apis/im/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "success"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let mut service = LoggingMiddleware::new().verbose().layer(client.clone());

        let req = client
            .post(format!("{}/open-apis/im/v1/messages", mock_server.uri()))
            .bearer_auth("t-test")
            .build()
            .unwrap();

        let response = service.call(req).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
