//! Shared request context for the API modules.

use std::sync::Arc;

use crate::client::FeishuClient;
use crate::token::TokenManager;

/// The HTTP client and token manager every API module sends through.
///
/// One context is built per bot; `ContactApi`, `UploadApi` and `MessageApi`
/// hold clones of the same `Arc`, so they share a single token cache.
#[derive(Clone)]
pub struct FeishuContext {
    pub(crate) client: Arc<FeishuClient>,
    pub(crate) token_manager: Arc<TokenManager>,
}

impl std::fmt::Debug for FeishuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuContext")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl FeishuContext {
    pub fn new(client: Arc<FeishuClient>, token_manager: Arc<TokenManager>) -> Self {
        Self {
            client,
            token_manager,
        }
    }

    pub fn client(&self) -> &FeishuClient {
        &self.client
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }
}
