//! Completion service seam

use async_trait::async_trait;
use launchpad_client::{ClientError, CompletionClient};

/// Fixed instruction sent ahead of every application description
pub const SYSTEM_INSTRUCTION: &str = "\
You are a professional front-end engineer. Based on the requirements below, generate the HTML, CSS and JavaScript as separate files.
- Follow the Google Material Design guidelines.
- The HTML must include <link rel=\"stylesheet\" href=\"styles.css\"> and <script src=\"script.js\" defer></script>.
- Output each file in its own fenced code block: ```html```, ```css``` and ```js```.";

/// Produces front-end source text from a free-text description
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Requests one completion for `description`
    ///
    /// The returned text is untrusted and unstructured.
    async fn generate(&self, description: &str) -> Result<String, ClientError>;
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn generate(&self, description: &str) -> Result<String, ClientError> {
        self.complete(SYSTEM_INSTRUCTION, description).await
    }
}
