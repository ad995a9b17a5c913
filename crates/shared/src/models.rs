use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an article sits on the left-right editorial spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
}

impl Direction {
    /// Map a 0-100 bias score onto the fixed direction bands.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => Direction::Left,
            31..=45 => Direction::CenterLeft,
            46..=54 => Direction::Center,
            55..=69 => Direction::CenterRight,
            _ => Direction::Right,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::CenterLeft => "center-left",
            Direction::Center => "center",
            Direction::CenterRight => "center-right",
            Direction::Right => "right",
        }
    }

    /// Parse a stored or model-supplied label. Accepts spaces or underscores
    /// in place of the hyphen.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "left" => Some(Direction::Left),
            "center-left" => Some(Direction::CenterLeft),
            "center" => Some(Direction::Center),
            "center-right" => Some(Direction::CenterRight),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of evidence behind a bias score.
///
/// Serialized with the wire names the model is asked for (`type`, `finding`).
/// Deserialization also accepts the legacy `description` key for the finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndicatorRecord")]
pub struct Indicator {
    #[serde(rename = "type")]
    pub category: String,
    pub finding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl Indicator {
    pub fn new(category: impl Into<String>, finding: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            finding: finding.into(),
            example: None,
        }
    }
}

#[derive(Deserialize)]
struct IndicatorRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    finding: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

impl From<IndicatorRecord> for Indicator {
    fn from(record: IndicatorRecord) -> Self {
        Self {
            category: record
                .kind
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| "general".to_string()),
            finding: prefer_current(record.finding, record.description).unwrap_or_default(),
            example: record.example.filter(|e| !e.is_empty()),
        }
    }
}

/// Resolve a renamed field: the current name wins unless it is absent or
/// empty, then the legacy name is used.
fn prefer_current(current: Option<String>, legacy: Option<String>) -> Option<String> {
    current
        .filter(|v| !v.trim().is_empty())
        .or_else(|| legacy.filter(|v| !v.trim().is_empty()))
}

/// Outcome of a single-article bias analysis.
///
/// The direction is always derived from the score when one is known, so the
/// two can never disagree. A score is absent only when the text fallback
/// recovered a direction keyword but no number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiasResult {
    score: Option<u8>,
    direction: Direction,
    indicators: Vec<Indicator>,
    assessment: String,
}

impl BiasResult {
    pub fn from_score(score: u8, indicators: Vec<Indicator>, assessment: impl Into<String>) -> Self {
        Self {
            score: Some(score),
            direction: Direction::from_score(score),
            indicators,
            assessment: assessment.into(),
        }
    }

    pub fn from_direction(
        direction: Direction,
        indicators: Vec<Indicator>,
        assessment: impl Into<String>,
    ) -> Self {
        Self {
            score: None,
            direction,
            indicators,
            assessment: assessment.into(),
        }
    }

    pub fn score(&self) -> Option<u8> {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn assessment(&self) -> &str {
        &self.assessment
    }
}

/// The JSON object the model returns for a bias analysis.
///
/// Both the current (`indicators`, `assessment`) and legacy
/// (`key_indicators`, `overall_assessment`) names are accepted;
/// [`BiasPayload::into_result`] is the single place they are resolved.
#[derive(Debug, Deserialize)]
pub struct BiasPayload {
    pub bias_score: u32,
    #[serde(default)]
    pub bias_direction: Option<String>,
    #[serde(default)]
    pub indicators: Option<Vec<Indicator>>,
    #[serde(default)]
    pub key_indicators: Option<Vec<Indicator>>,
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub overall_assessment: Option<String>,
}

impl BiasPayload {
    /// Validate the score range and resolve field aliases.
    pub fn into_result(self) -> Result<BiasResult, String> {
        let score = u8::try_from(self.bias_score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| format!("bias_score {} is outside 0-100", self.bias_score))?;

        let derived = Direction::from_score(score);
        if let Some(label) = self.bias_direction.as_deref() {
            if Direction::parse(label) != Some(derived) {
                tracing::warn!(
                    score,
                    model_direction = label,
                    derived = %derived,
                    "Model direction disagrees with score, using score"
                );
            }
        }

        let indicators = match self.indicators {
            Some(list) if !list.is_empty() => list,
            _ => self.key_indicators.unwrap_or_default(),
        };
        let assessment =
            prefer_current(self.assessment, self.overall_assessment).unwrap_or_default();

        Ok(BiasResult::from_score(score, indicators, assessment))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreedFact {
    pub fact: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perspective {
    pub source: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferingPerspective {
    pub topic: String,
    #[serde(default)]
    pub perspectives: Vec<Perspective>,
}

/// Balanced multi-source summary of a story, as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(default)]
    pub agreed_facts: Vec<AgreedFact>,
    #[serde(default)]
    pub differing_perspectives: Vec<DifferingPerspective>,
    #[serde(rename = "potential_blind_spots", alias = "blind_spots", default)]
    pub blind_spots: Vec<String>,
    pub balanced_summary: String,
    #[serde(default)]
    pub unanswered_questions: Vec<String>,
}

/// A stored news article.
///
/// Analysis fields are flattened onto the record as `bias_score`,
/// `bias_direction`, `key_indicators` and `bias_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub source: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub added_at: String,
    #[serde(default)]
    pub bias_score: Option<u8>,
    #[serde(default)]
    pub bias_direction: Option<String>,
    #[serde(default)]
    pub key_indicators: Option<Vec<Indicator>>,
    #[serde(default)]
    pub bias_analysis: Option<String>,
}

impl Article {
    /// Rebuild the stored analysis, if the article has been analyzed.
    pub fn prior_analysis(&self) -> Option<BiasResult> {
        let indicators = self.key_indicators.clone().unwrap_or_default();
        let assessment = self.bias_analysis.clone().unwrap_or_default();

        match self.bias_score {
            Some(score) => Some(BiasResult::from_score(score.min(100), indicators, assessment)),
            None => self
                .bias_direction
                .as_deref()
                .and_then(Direction::parse)
                .map(|direction| BiasResult::from_direction(direction, indicators, assessment)),
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.bias_score.is_some() || self.bias_direction.is_some()
    }
}

/// Fields supplied when adding an article; the store assigns the rest.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub source: String,
    pub content: String,
    pub url: Option<String>,
    pub story_id: Option<String>,
}

/// A named group of articles covering the same event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct StorySummary {
    pub story: Story,
    pub article_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Direction Threshold Tests ====================

    #[test]
    fn test_direction_band_boundaries() {
        assert_eq!(Direction::from_score(0), Direction::Left);
        assert_eq!(Direction::from_score(30), Direction::Left);
        assert_eq!(Direction::from_score(31), Direction::CenterLeft);
        assert_eq!(Direction::from_score(45), Direction::CenterLeft);
        assert_eq!(Direction::from_score(46), Direction::Center);
        assert_eq!(Direction::from_score(54), Direction::Center);
        assert_eq!(Direction::from_score(55), Direction::CenterRight);
        assert_eq!(Direction::from_score(69), Direction::CenterRight);
        assert_eq!(Direction::from_score(70), Direction::Right);
        assert_eq!(Direction::from_score(100), Direction::Right);
    }

    #[test]
    fn test_direction_every_score_lands_in_exactly_one_band() {
        for score in 0..=100u8 {
            let expected = if score < 31 {
                Direction::Left
            } else if score <= 45 {
                Direction::CenterLeft
            } else if score <= 54 {
                Direction::Center
            } else if score <= 69 {
                Direction::CenterRight
            } else {
                Direction::Right
            };
            assert_eq!(Direction::from_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_direction_parse_variants() {
        assert_eq!(Direction::parse("center-left"), Some(Direction::CenterLeft));
        assert_eq!(Direction::parse("Center Right"), Some(Direction::CenterRight));
        assert_eq!(Direction::parse("center_left"), Some(Direction::CenterLeft));
        assert_eq!(Direction::parse("unknown"), None);
        assert_eq!(Direction::CenterLeft.to_string(), "center-left");
    }

    // ==================== Payload Resolution Tests ====================

    #[test]
    fn test_payload_prefers_current_field_names() {
        let payload: BiasPayload = serde_json::from_str(
            r#"{
                "bias_score": 40,
                "indicators": [{"type": "framing", "finding": "new"}],
                "key_indicators": [{"type": "tone", "finding": "old"}],
                "assessment": "Current.",
                "overall_assessment": "Legacy."
            }"#,
        )
        .unwrap();

        let result = payload.into_result().unwrap();
        assert_eq!(result.indicators(), &[Indicator::new("framing", "new")]);
        assert_eq!(result.assessment(), "Current.");
    }

    #[test]
    fn test_payload_falls_back_to_legacy_field_names() {
        let payload: BiasPayload = serde_json::from_str(
            r#"{
                "bias_score": 12,
                "key_indicators": [{"type": "omission", "description": "Left out context"}],
                "overall_assessment": "Legacy assessment."
            }"#,
        )
        .unwrap();

        let result = payload.into_result().unwrap();
        assert_eq!(result.indicators()[0].finding, "Left out context");
        assert_eq!(result.assessment(), "Legacy assessment.");
        assert_eq!(result.direction(), Direction::Left);
    }

    #[test]
    fn test_payload_direction_follows_score_not_model_label() {
        let payload: BiasPayload =
            serde_json::from_str(r#"{"bias_score": 72, "bias_direction": "center"}"#).unwrap();

        let result = payload.into_result().unwrap();
        assert_eq!(result.score(), Some(72));
        assert_eq!(result.direction(), Direction::Right);
    }

    #[test]
    fn test_payload_rejects_out_of_range_score() {
        let payload: BiasPayload = serde_json::from_str(r#"{"bias_score": 140}"#).unwrap();
        assert!(payload.into_result().is_err());
    }

    #[test]
    fn test_indicator_defaults_missing_type_to_general() {
        let indicator: Indicator = serde_json::from_str(r#"{"finding": "x"}"#).unwrap();
        assert_eq!(indicator.category, "general");
    }

    #[test]
    fn test_indicator_serializes_wire_names() {
        let json = serde_json::to_value(Indicator::new("tone", "Dismissive")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "tone", "finding": "Dismissive"}));
    }

    // ==================== Stored Article Tests ====================

    #[test]
    fn test_prior_analysis_rebuilds_from_stored_fields() {
        let article: Article = serde_json::from_str(
            r#"{
                "id": "a1b2c3d4",
                "title": "T",
                "source": "S",
                "content": "C",
                "bias_score": 58,
                "bias_direction": "center",
                "key_indicators": [{"type": "framing", "finding": "f"}],
                "bias_analysis": "Stored."
            }"#,
        )
        .unwrap();

        let analysis = article.prior_analysis().unwrap();
        assert_eq!(analysis.direction(), Direction::CenterRight);
        assert_eq!(analysis.assessment(), "Stored.");
        assert_eq!(analysis.indicators().len(), 1);
    }

    #[test]
    fn test_unanalyzed_article_has_no_prior_analysis() {
        let article: Article = serde_json::from_str(
            r#"{"id": "x", "title": "T", "source": "S", "content": "C", "bias_score": null}"#,
        )
        .unwrap();

        assert!(!article.is_analyzed());
        assert!(article.prior_analysis().is_none());
    }
}
