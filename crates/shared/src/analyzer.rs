use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::config::LlmSettings;
use crate::credentials::CredentialSource;
use crate::error::PipelineError;
use crate::extract::extract_json;
use crate::llm::{ModelInvoker, ModelRequest};
use crate::models::{Article, BiasPayload, BiasResult, Direction};
use crate::prompts::{truncate_chars, PromptBuilder};

pub const UNPARSEABLE_MESSAGE: &str = "Could not parse Claude's response";
pub const PLACEHOLDER_ASSESSMENT: &str = "Analysis completed but detailed breakdown unavailable.";

const RAW_SNIPPET_CHARS: usize = 1_000;
const ASSESSMENT_CHARS: usize = 500;

// "Bias Score: 72", "bias score 40". Integer only, "bias" before "score".
static SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[Bb]ias\s*[Ss]core[:\s]*(\d+)").expect("valid score regex"));

static ASSESSMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)[Aa]ssessment[:\s]*(.+?)(?:\n\n|\z)").expect("valid assessment regex")
});

/// Single-article bias analysis pipeline.
pub struct BiasAnalyzer {
    invoker: Arc<dyn ModelInvoker>,
    credentials: Arc<dyn CredentialSource>,
    prompts: PromptBuilder,
    settings: LlmSettings,
}

impl BiasAnalyzer {
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

    /// Score one article. The credential is checked before anything is sent.
    pub async fn analyze(&self, article: &Article) -> Result<BiasResult, PipelineError> {
        let api_key = self.credentials.require_credential()?;

        let request = ModelRequest {
            model: self.settings.model.clone(),
            prompt: self.prompts.analysis_prompt(article),
            max_tokens: self.settings.analysis_max_tokens,
        };
        tracing::debug!(article = %article.id, prompt_chars = request.prompt.len(), "Built analysis prompt");

        let raw = self.invoker.complete(&api_key, &request).await?;
        parse_bias_response(&raw)
    }
}

/// Parse a raw model reply, falling back to text recovery when the JSON is
/// missing or invalid.
pub fn parse_bias_response(raw: &str) -> Result<BiasResult, PipelineError> {
    match parse_strict(raw) {
        Ok(result) => Ok(result),
        Err(e) => {
            tracing::warn!(error = %e, "Strict parse failed, trying text fallback");
            recover_from_text(raw)
        }
    }
}

fn parse_strict(raw: &str) -> Result<BiasResult, PipelineError> {
    let parse_error = |message: String| PipelineError::Parse {
        message,
        raw_response: raw.to_string(),
    };

    let payload: BiasPayload = serde_json::from_str(extract_json(raw))
        .map_err(|e| parse_error(format!("Invalid analysis JSON: {}", e)))?;

    payload.into_result().map_err(parse_error)
}

/// Best-effort recovery from prose. Reads the raw reply, not the narrowed
/// JSON text.
pub fn recover_from_text(raw: &str) -> Result<BiasResult, PipelineError> {
    let score = SCORE_RE
        .captures(raw)
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .filter(|score| *score <= 100);

    let assessment = ASSESSMENT_RE
        .captures(raw)
        .map(|caps| truncate_chars(caps[1].trim(), ASSESSMENT_CHARS).to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_ASSESSMENT.to_string());

    if let Some(score) = score {
        return Ok(BiasResult::from_score(score, Vec::new(), assessment));
    }

    match direction_from_keywords(raw) {
        Some(direction) => Ok(BiasResult::from_direction(direction, Vec::new(), assessment)),
        None => Err(PipelineError::UnrecoverableParse {
            message: UNPARSEABLE_MESSAGE.to_string(),
            raw_response: truncate_chars(raw, RAW_SNIPPET_CHARS).to_string(),
        }),
    }
}

fn direction_from_keywords(raw: &str) -> Option<Direction> {
    let text = raw.to_lowercase();
    if text.contains("left-leaning") || text.contains("left leaning") {
        Some(Direction::Left)
    } else if text.contains("right-leaning") || text.contains("right leaning") {
        Some(Direction::Right)
    } else if text.contains("neutral") || text.contains("center") {
        Some(Direction::Center)
    } else {
        None
    }
}
