pub mod gemini;
pub mod image;

use async_trait::async_trait;

/// Generates a reply to a single utterance, with no memory of earlier calls.
#[async_trait]
pub trait TextResponder: Send + Sync {
    async fn respond(&self, utterance: &str) -> anyhow::Result<String>;
}

/// Describes an image according to `prompt`.
#[async_trait]
pub trait VisionResponder: Send + Sync {
    async fn describe(&self, image: &[u8], prompt: &str) -> anyhow::Result<String>;
}
