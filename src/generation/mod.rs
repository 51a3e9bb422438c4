//! Text generation: prompt templates, the generator seam, and the
//! watsonx.ai client behind it.

pub mod prompts;
pub mod watsonx;

use async_trait::async_trait;

use crate::Result;

pub use prompts::Prompt;
pub use watsonx::{AccessToken, WatsonxClient, WatsonxSession};

/// Single synchronous request/response call returning raw generated text.
///
/// Failures (timeout, non-2xx, auth) are returned, never retried here.
#[async_trait]
pub trait TextGenerator: Send {
    async fn generate(&mut self, prompt: &Prompt) -> Result<String>;
}
