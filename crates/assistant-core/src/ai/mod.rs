pub mod ollama;

use async_trait::async_trait;

use crate::error::ChatError;

pub use ollama::OllamaClient;

/// A service that turns a prompt into generated text.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Short name for logs and the header.
    fn name(&self) -> &str;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Generate a reply. `Ok(None)` means the provider answered but carried
    /// no text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ChatError>;
}
