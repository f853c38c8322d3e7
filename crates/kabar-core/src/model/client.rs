use async_trait::async_trait;

use crate::Result;

/// Single-shot text completion: one prompt in, one text out.
///
/// Implementations must not keep conversation state between calls.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider name for logs.
    fn provider(&self) -> &str;

    /// Name of the credential this client needs but does not have, if any.
    fn missing_credential(&self) -> Option<&'static str> {
        None
    }

    async fn complete(&self, prompt: &str) -> Result<String>;
}
