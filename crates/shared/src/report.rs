use crate::error::PipelineError;
use crate::models::{BiasResult, ComparisonResult};
use crate::prompts::truncate_chars;

const EXAMPLE_CHARS: usize = 100;

/// Renders pipeline results as plain terminal text.
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format_error(error: &PipelineError) -> String {
        format!("Error: {}", error)
    }

    pub fn format_analysis(analysis: &BiasResult) -> String {
        let mut lines = Vec::new();

        let score = analysis
            .score()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!("Bias Score: {}/100 ({})", score, analysis.direction()));
        lines.push(String::new());

        if !analysis.indicators().is_empty() {
            lines.push("Key Bias Indicators:".to_string());
            for indicator in analysis.indicators() {
                lines.push(format!(
                    "  • {}: {}",
                    Self::title_case(&indicator.category.replace('_', " ")),
                    indicator.finding
                ));
                if let Some(example) = &indicator.example {
                    let shown = truncate_chars(example, EXAMPLE_CHARS);
                    if shown.len() < example.len() {
                        lines.push(format!("    Example: \"{}...\"", shown));
                    } else {
                        lines.push(format!("    Example: \"{}\"", example));
                    }
                }
            }
            lines.push(String::new());
        }

        if !analysis.assessment().is_empty() {
            lines.push(format!("Assessment: {}", analysis.assessment()));
        }

        lines.join("\n")
    }

    pub fn format_analysis_outcome(outcome: &Result<BiasResult, PipelineError>) -> String {
        match outcome {
            Ok(analysis) => Self::format_analysis(analysis),
            Err(e) => Self::format_error(e),
        }
    }

    /// Sections with nothing to show are left out entirely.
    pub fn format_comparison(comparison: &ComparisonResult) -> String {
        let mut lines = Vec::new();

        if !comparison.agreed_facts.is_empty() {
            lines.push("[AGREED FACTS]".to_string());
            lines.push("These points are supported by multiple sources:".to_string());
            for fact in &comparison.agreed_facts {
                lines.push(format!("  • {}", fact.fact));
                lines.push(format!("    Reported by: {}", fact.sources.join(", ")));
            }
            lines.push(String::new());
        }

        if !comparison.differing_perspectives.is_empty() {
            lines.push("[WHERE SOURCES DIFFER]".to_string());
            for diff in &comparison.differing_perspectives {
                lines.push(format!("  Topic: {}", diff.topic));
                for perspective in &diff.perspectives {
                    lines.push(format!(
                        "    - {}: {}",
                        perspective.source, perspective.position
                    ));
                }
            }
            lines.push(String::new());
        }

        if !comparison.blind_spots.is_empty() {
            lines.push("[POTENTIAL BLIND SPOTS]".to_string());
            for spot in &comparison.blind_spots {
                lines.push(format!("  • {}", spot));
            }
            lines.push(String::new());
        }

        if !comparison.balanced_summary.is_empty() {
            lines.push("[BALANCED SUMMARY]".to_string());
            lines.push(comparison.balanced_summary.clone());
            lines.push(String::new());
        }

        if !comparison.unanswered_questions.is_empty() {
            lines.push("[UNANSWERED QUESTIONS]".to_string());
            for question in &comparison.unanswered_questions {
                lines.push(format!("  • {}", question));
            }
        }

        lines.join("\n")
    }

    pub fn format_comparison_outcome(outcome: &Result<ComparisonResult, PipelineError>) -> String {
        match outcome {
            Ok(comparison) => Self::format_comparison(comparison),
            Err(e) => Self::format_error(e),
        }
    }

    /// Uppercase the first letter of every word and lowercase the rest.
    fn title_case(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut at_word_start = true;
        for c in text.chars() {
            if c.is_alphabetic() {
                if at_word_start {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                at_word_start = false;
            } else {
                out.push(c);
                at_word_start = true;
            }
        }
        out
    }
}
