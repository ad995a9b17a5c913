use std::sync::Arc;

use crate::config::LlmSettings;
use crate::credentials::CredentialSource;
use crate::error::PipelineError;
use crate::extract::extract_json;
use crate::llm::{ModelInvoker, ModelRequest};
use crate::models::{Article, ComparisonResult};
use crate::prompts::PromptBuilder;

pub const MIN_ARTICLES: usize = 2;

/// Multi-article comparison pipeline. Produces a balanced summary of how
/// several outlets covered the same story.
pub struct StoryComparer {
    invoker: Arc<dyn ModelInvoker>,
    credentials: Arc<dyn CredentialSource>,
    prompts: PromptBuilder,
    settings: LlmSettings,
}

impl StoryComparer {
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        credentials: Arc<dyn CredentialSource>,
        prompts: PromptBuilder,
        settings: LlmSettings,
    ) -> Self {
        Self {
            invoker,
            credentials,
            prompts,
            settings,
        }
    }

    pub async fn compare(&self, articles: &[Article]) -> Result<ComparisonResult, PipelineError> {
        if articles.len() < MIN_ARTICLES {
            return Err(PipelineError::InsufficientArticles(articles.len()));
        }

        let api_key = self.credentials.require_credential()?;

        let request = ModelRequest {
            model: self.settings.model.clone(),
            prompt: self.prompts.comparison_prompt(articles),
            max_tokens: self.settings.comparison_max_tokens,
        };
        tracing::debug!(
            articles = articles.len(),
            prompt_chars = request.prompt.len(),
            "Built comparison prompt"
        );

        let raw = self.invoker.complete(&api_key, &request).await?;
        parse_comparison_response(&raw)
    }
}

/// Strict parse only; there is no text fallback for comparisons.
pub fn parse_comparison_response(raw: &str) -> Result<ComparisonResult, PipelineError> {
    serde_json::from_str(extract_json(raw)).map_err(|e| {
        tracing::warn!(error = %e, "Comparison response is not valid JSON");
        PipelineError::Parse {
            message: "Could not parse Claude's response as JSON".to_string(),
            raw_response: raw.to_string(),
        }
    })
}
