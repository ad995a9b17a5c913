use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::models::Article;

/// Body length sent for single-article analysis, in characters.
pub const MAX_ANALYSIS_CHARS: usize = 15_000;
/// Body length sent per article in a comparison, in characters.
pub const MAX_COMPARISON_CHARS: usize = 5_000;

const ANALYSIS_TEMPLATE: &str = r#"You are an expert media analyst specializing in detecting bias in news reporting. Analyze the following article for potential bias.

ARTICLE TITLE: {title}
SOURCE: {source}
CONTENT:
{content}

Analyze this article and provide:

1. BIAS SCORE (0-100): 0-30=left, 31-45=center-left, 46-54=center, 55-69=center-right, 70-100=right

2. KEY BIAS INDICATORS found (loaded language, framing, source selection, omissions, tone)

3. OVERALL ASSESSMENT (2-3 sentences)

IMPORTANT: Return ONLY valid JSON. Escape any quotes within strings using backslash.

Return this exact JSON structure:
{
    "bias_score": 50,
    "bias_direction": "center",
    "indicators": [
        {"type": "framing", "finding": "Description of the bias indicator found"}
    ],
    "assessment": "2-3 sentence overall assessment."
}"#;

const COMPARISON_TEMPLATE: &str = r#"You are an expert journalist tasked with creating a balanced summary from multiple news sources covering the same story.

Here are articles from different sources on the same topic:

{articles_text}

Please create a balanced summary that:

1. **AGREED FACTS**: Facts that all or most sources agree on
2. **DIFFERING PERSPECTIVES**: Where sources disagree or present different angles
3. **POTENTIAL BLIND SPOTS**: Information that might be missing or underreported
4. **BALANCED SUMMARY**: A neutral 2-3 paragraph summary that fairly represents all perspectives

Guidelines:
- Stay neutral - don't favor any source
- Cite which source(s) support each claim using [Source Name] format
- Highlight where sources contradict each other
- Note what questions remain unanswered
- Flag any disputed claims clearly

Respond in this JSON format:
{
    "agreed_facts": [
        {"fact": "<the fact>", "sources": ["source1", "source2"]}
    ],
    "differing_perspectives": [
        {"topic": "<topic of disagreement>", "perspectives": [{"source": "source1", "position": "<their position>"}, {"source": "source2", "position": "<their position>"}]}
    ],
    "potential_blind_spots": ["<what might be missing>"],
    "balanced_summary": "<2-3 paragraph neutral summary>",
    "unanswered_questions": ["<questions that remain>"]
}"#;

/// Instruction templates for both pipelines.
///
/// Placeholders are `{title}`, `{source}`, `{content}` for analysis and
/// `{articles_text}` for comparison. Any other brace is literal text, so the
/// embedded JSON examples need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub analysis: String,
    pub comparison: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            analysis: ANALYSIS_TEMPLATE.to_string(),
            comparison: COMPARISON_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Built-in templates, with `analysis.txt` / `comparison.txt` from `dir`
    /// replacing them where present.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut templates = Self::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        let analysis_path = dir.join("analysis.txt");
        if analysis_path.exists() {
            templates.analysis = fs::read_to_string(&analysis_path).with_context(|| {
                format!("Failed to read prompt template: {}", analysis_path.display())
            })?;
            tracing::info!(path = %analysis_path.display(), "Loaded analysis prompt override");
        }

        let comparison_path = dir.join("comparison.txt");
        if comparison_path.exists() {
            templates.comparison = fs::read_to_string(&comparison_path).with_context(|| {
                format!("Failed to read prompt template: {}", comparison_path.display())
            })?;
            tracing::info!(path = %comparison_path.display(), "Loaded comparison prompt override");
        }

        Ok(templates)
    }
}

/// Renders prompts from article data. Cheap to clone; templates are shared.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    templates: Arc<PromptTemplates>,
}

impl PromptBuilder {
    pub fn new(templates: PromptTemplates) -> Self {
        Self {
            templates: Arc::new(templates),
        }
    }

    pub fn analysis_prompt(&self, article: &Article) -> String {
        render(
            &self.templates.analysis,
            &[
                ("title", article.title.as_str()),
                ("source", article.source.as_str()),
                ("content", truncate_chars(&article.content, MAX_ANALYSIS_CHARS)),
            ],
        )
    }

    pub fn comparison_prompt(&self, articles: &[Article]) -> String {
        let articles_text: String = articles
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let bias_info = article
                    .bias_score
                    .map(|score| format!(" (Bias Score: {}/100)", score))
                    .unwrap_or_default();
                format!(
                    "\n---\nARTICLE {}\nSource: {}{}\nTitle: {}\n\n{}\n\n---\n",
                    i + 1,
                    article.source,
                    bias_info,
                    article.title,
                    truncate_chars(&article.content, MAX_COMPARISON_CHARS)
                )
            })
            .collect();

        render(
            &self.templates.comparison,
            &[("articles_text", articles_text.as_str())],
        )
    }
}

/// Substitute `{name}` placeholders in a single pass, so values containing
/// placeholder text are never expanded a second time.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let matched = vars
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));

        match matched {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// The first `max` characters of `text`, respecting UTF-8 boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(source: &str, content: &str, bias_score: Option<u8>) -> Article {
        Article {
            id: "id".to_string(),
            title: format!("{} headline", source),
            source: source.to_string(),
            content: content.to_string(),
            url: None,
            story_id: None,
            added_at: String::new(),
            bias_score,
            bias_direction: None,
            key_indicators: None,
            bias_analysis: None,
        }
    }

    // ==================== Truncation Tests ====================

    #[test]
    fn test_truncate_chars_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
    }

    // ==================== Rendering Tests ====================

    #[test]
    fn test_render_leaves_unknown_braces() {
        let out = render("{\"a\": {name}} {other}", &[("name", "x")]);
        assert_eq!(out, "{\"a\": x} {other}");
    }

    #[test]
    fn test_render_does_not_expand_values() {
        let out = render("{title} / {source}", &[("title", "{source}"), ("source", "CNN")]);
        assert_eq!(out, "{source} / CNN");
    }

    // ==================== Analysis Prompt Tests ====================

    #[test]
    fn test_analysis_prompt_embeds_article_and_schema() {
        let prompt = PromptBuilder::default().analysis_prompt(&article("BBC", "Body text", None));

        assert!(prompt.contains("ARTICLE TITLE: BBC headline"));
        assert!(prompt.contains("SOURCE: BBC"));
        assert!(prompt.contains("CONTENT:\nBody text\n"));
        assert!(prompt.contains("\"bias_score\": 50,"));
        assert!(prompt.contains(
            "{\"type\": \"framing\", \"finding\": \"Description of the bias indicator found\"}"
        ));
        assert!(!prompt.contains("{title}"));
    }

    #[test]
    fn test_analysis_prompt_truncates_body() {
        let long = "x".repeat(MAX_ANALYSIS_CHARS + 500);
        let prompt = PromptBuilder::default().analysis_prompt(&article("AP", &long, None));

        assert!(prompt.contains(&"x".repeat(MAX_ANALYSIS_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_ANALYSIS_CHARS + 1)));
    }

    // ==================== Comparison Prompt Tests ====================

    #[test]
    fn test_comparison_prompt_numbers_blocks_and_includes_scores() {
        let articles = vec![
            article("CNN", "First body", Some(35)),
            article("Fox News", "Second body", None),
        ];
        let prompt = PromptBuilder::default().comparison_prompt(&articles);

        assert!(prompt.contains("ARTICLE 1\nSource: CNN (Bias Score: 35/100)\nTitle: CNN headline"));
        assert!(prompt.contains("ARTICLE 2\nSource: Fox News\nTitle: Fox News headline"));
        assert!(prompt.contains("\"potential_blind_spots\": [\"<what might be missing>\"],"));
    }

    #[test]
    fn test_comparison_prompt_truncates_each_block() {
        let long = "y".repeat(MAX_COMPARISON_CHARS * 2);
        let articles = vec![article("A", &long, None), article("B", "short", None)];
        let prompt = PromptBuilder::default().comparison_prompt(&articles);

        assert!(prompt.contains(&"y".repeat(MAX_COMPARISON_CHARS)));
        assert!(!prompt.contains(&"y".repeat(MAX_COMPARISON_CHARS + 1)));
    }

    #[test]
    fn test_custom_templates_are_used() {
        let builder = PromptBuilder::new(PromptTemplates {
            analysis: "Rate {source}: {title}".to_string(),
            comparison: "Compare:{articles_text}".to_string(),
        });

        assert_eq!(builder.analysis_prompt(&article("NPR", "c", None)), "Rate NPR: NPR headline");
    }

    #[test]
    fn test_load_reads_overrides_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("analysis.txt"), "custom {title}").unwrap();

        let templates = PromptTemplates::load(Some(dir.path())).unwrap();
        assert_eq!(templates.analysis, "custom {title}");
        assert_eq!(templates.comparison, COMPARISON_TEMPLATE);
    }
}
