//! Contact API
//!
//! Looks up a user's open_id by phone number or email.
//!
//! POST /open-apis/contact/v3/users/batch_get_id?user_id_type=open_id

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::FeishuContext;
use crate::error::FeishuError;
use crate::types::ApiResponse;

pub(crate) const BATCH_GET_ID_PATH: &str = "/open-apis/contact/v3/users/batch_get_id";

#[derive(Debug, Serialize)]
struct BatchGetIdRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    mobiles: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emails: Option<[&'a str; 1]>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchGetIdData {
    #[serde(default)]
    pub user_list: Vec<UserIdEntry>,
}

/// One lookup result; `user_id` is absent when nothing matched.
#[derive(Debug, Clone, Deserialize)]
pub struct UserIdEntry {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub struct ContactApi {
    context: Arc<FeishuContext>,
}

impl ContactApi {
    pub fn new(context: Arc<FeishuContext>) -> Self {
        Self { context }
    }

    /// Resolve the open_id of the user with the given phone and/or email.
    ///
    /// Both identifiers are sent when both are set; the first returned
    /// record carrying a `user_id` wins.
    ///
    /// # Errors
    /// - `FeishuError::Config` if neither phone nor email is given (no request is made)
    /// - `FeishuError::Api` if the lookup call fails
    /// - `FeishuError::Lookup` if no record carries a `user_id`
    pub async fn resolve_open_id(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<String, FeishuError> {
        let phone = phone.filter(|p| !p.is_empty());
        let email = email.filter(|e| !e.is_empty());
        if phone.is_none() && email.is_none() {
            return Err(FeishuError::Config(
                "to query open_id when FEISHU_OPEN_ID isn't set, FEISHU_PHONE or FEISHU_EMAIL \
                 must be set with your phone or email"
                    .to_string(),
            ));
        }

        let body = BatchGetIdRequest {
            mobiles: phone.map(|p| [p]),
            emails: email.map(|e| [e]),
        };

        let token = self.context.token_manager.get_token().await?;
        let response: ApiResponse<BatchGetIdData> = self
            .context
            .client
            .post(
                BATCH_GET_ID_PATH,
                Some(&token),
                &[("user_id_type", "open_id")],
                &body,
            )
            .await?;

        let data = response.data.unwrap_or_default();
        let open_id = data
            .user_list
            .into_iter()
            .find_map(|user| user.user_id)
            .ok_or_else(|| {
                FeishuError::Lookup(format!(
                    "no user_id found for mobiles={:?} emails={:?}",
                    body.mobiles, body.emails
                ))
            })?;

        debug!("[FeishuBot] resolved recipient open_id {}", open_id);
        Ok(open_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FeishuClient;
    use crate::token::TokenManager;
    use crate::types::{AppId, AppSecret};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_context(base_url: &str) -> Arc<FeishuContext> {
        let client = Arc::new(
            FeishuClient::builder()
                .app_id(AppId::new("cli_test_app").unwrap())
                .app_secret(AppSecret::new("test_secret").unwrap())
                .base_url(base_url)
                .build()
                .unwrap(),
        );
        let token_manager = Arc::new(TokenManager::new((*client).clone()));
        Arc::new(FeishuContext::new(client, token_manager))
    }

    async fn mount_token(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/open-apis/auth/v3/tenant_access_token/internal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "ok",
                "tenant_access_token": "t-test",
                "expire": 7200
            })))
            .mount(mock_server)
            .await;
    }

    #[test]
    fn test_request_body_skips_missing_fields() {
        let body = BatchGetIdRequest {
            mobiles: Some(["13800000000"]),
            emails: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"mobiles": ["13800000000"]})
        );
    }

    #[tokio::test]
    async fn test_resolve_by_phone() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(BATCH_GET_ID_PATH))
            .and(query_param("user_id_type", "open_id"))
            .and(header("authorization", "Bearer t-test"))
            .and(body_json(serde_json::json!({"mobiles": ["13800000000"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "success",
                "data": {"user_list": [{"mobile": "13800000000", "user_id": "ou_phone"}]}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = ContactApi::new(create_test_context(&mock_server.uri()));
        let open_id = api.resolve_open_id(Some("13800000000"), None).await.unwrap();
        assert_eq!(open_id, "ou_phone");
    }

    #[tokio::test]
    async fn test_resolve_sends_both_and_skips_unmatched_records() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(BATCH_GET_ID_PATH))
            .and(body_json(serde_json::json!({
                "mobiles": ["13800000000"],
                "emails": ["dev@example.com"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "success",
                "data": {"user_list": [
                    {"mobile": "13800000000"},
                    {"email": "dev@example.com", "user_id": "ou_email"}
                ]}
            })))
            .mount(&mock_server)
            .await;

        let api = ContactApi::new(create_test_context(&mock_server.uri()));
        let open_id = api
            .resolve_open_id(Some("13800000000"), Some("dev@example.com"))
            .await
            .unwrap();
        assert_eq!(open_id, "ou_email");
    }

    #[tokio::test]
    async fn test_resolve_no_match_is_lookup_error() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(BATCH_GET_ID_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0,
                "msg": "success",
                "data": {"user_list": [{"email": "nobody@example.com"}]}
            })))
            .mount(&mock_server)
            .await;

        let api = ContactApi::new(create_test_context(&mock_server.uri()));
        let result = api.resolve_open_id(None, Some("nobody@example.com")).await;
        assert!(matches!(result, Err(FeishuError::Lookup(_))));
    }

    #[tokio::test]
    async fn test_resolve_without_identifiers_makes_no_request() {
        let mock_server = MockServer::start().await;

        let api = ContactApi::new(create_test_context(&mock_server.uri()));
        let result = api.resolve_open_id(None, Some("")).await;

        assert!(matches!(result, Err(FeishuError::Config(_))));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}
