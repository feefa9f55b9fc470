//! Bot configuration.
//!
//! Read once from the environment at startup (or built in code) and handed
//! to [`FeishuBot::builder`](crate::FeishuBot::builder).
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `FEISHU_APP_ID` | application id |
//! | `FEISHU_APP_SECRET` | application secret |
//! | `FEISHU_OPEN_ID` | open_id of the recipient |
//! | `FEISHU_PHONE` | recipient phone, used to look up the open_id |
//! | `FEISHU_EMAIL` | recipient email, used to look up the open_id |
//! | `FEISHU_BASE_URL` | API origin, defaults to `https://open.feishu.cn` |
//!
//! When `FEISHU_OPEN_ID` is not set the phone is looked up together with the
//! email.

use std::env;

pub const ENV_APP_ID: &str = "FEISHU_APP_ID";
pub const ENV_APP_SECRET: &str = "FEISHU_APP_SECRET";
pub const ENV_OPEN_ID: &str = "FEISHU_OPEN_ID";
pub const ENV_PHONE: &str = "FEISHU_PHONE";
pub const ENV_EMAIL: &str = "FEISHU_EMAIL";
pub const ENV_BASE_URL: &str = "FEISHU_BASE_URL";

/// Credentials and recipient settings.
///
/// Empty strings are treated as unset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FeishuConfig {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub open_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for FeishuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[REDACTED]"))
            .field("open_id", &self.open_id)
            .field("phone", &self.phone)
            .field("email", &self.email)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FeishuConfig {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: non_empty(Some(app_id.into())),
            app_secret: non_empty(Some(app_secret.into())),
            ..Self::default()
        }
    }

    /// Read the `FEISHU_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            app_id: non_empty(lookup(ENV_APP_ID)),
            app_secret: non_empty(lookup(ENV_APP_SECRET)),
            open_id: non_empty(lookup(ENV_OPEN_ID)),
            phone: non_empty(lookup(ENV_PHONE)),
            email: non_empty(lookup(ENV_EMAIL)),
            base_url: non_empty(lookup(ENV_BASE_URL)),
        }
    }

    pub fn with_open_id(mut self, open_id: impl Into<String>) -> Self {
        self.open_id = non_empty(Some(open_id.into()));
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = non_empty(Some(phone.into()));
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(Some(email.into()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = non_empty(Some(base_url.into()));
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.app_id.is_some() && self.app_secret.is_some()
    }

    pub fn has_recipient(&self) -> bool {
        self.open_id.is_some() || self.phone.is_some() || self.email.is_some()
    }

    /// True iff both credentials and at least one recipient field are set.
    pub fn is_enabled(&self) -> bool {
        self.has_credentials() && self.has_recipient()
    }
}
