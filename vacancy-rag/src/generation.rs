//! The answer-generation capability the retrieval pipeline delegates to.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that turns a system prompt and a user prompt into an answer.
///
/// Implementations own transport, authentication and retries. Failures are
/// reported as [`RagError::Generation`](crate::RagError::Generation) and are
/// passed through the pipeline untouched.
///
/// # Example
///
/// ```rust,ignore
/// use vacancy_rag::AnswerGenerator;
///
/// let answer = generator.generate(SYSTEM_PROMPT, &user_prompt).await?;
/// ```
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce a complete answer. Partial output is never returned.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// A short provider name used in logs and errors.
    fn name(&self) -> &str;
}
