use serde::Deserialize;

/// The `{code, msg, data}` wrapper shared by every Feishu open API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Take the `data` payload, failing when a successful envelope omitted it.
    pub fn into_data(self) -> Result<T, crate::error::FeishuError> {
        crate::error::FeishuError::check_api(self.code, &self.msg)?;
        self.data.ok_or_else(|| crate::error::FeishuError::Api {
            code: self.code,
            message: format!("response has no data: {}", self.msg),
        })
    }
}
