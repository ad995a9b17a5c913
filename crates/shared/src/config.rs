use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// Model parameters shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub model: String,
    pub analysis_max_tokens: u32,
    pub comparison_max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            analysis_max_tokens: 2000,
            comparison_max_tokens: 3000,
        }
    }
}

/// Process-wide settings, read once at startup.
///
/// The API key is resolved per run instead, see
/// [`crate::credentials::EnvCredential`].
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub api_base_url: String,
    /// HTTP timeout for model calls. `None` leaves the transport default.
    pub request_timeout: Option<Duration>,
    pub data_dir: PathBuf,
    /// Directory with `analysis.txt` / `comparison.txt` template overrides.
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = LlmSettings::default();

        let model = get("UNBIASED_NEWS_MODEL").unwrap_or(defaults.model);

        let analysis_max_tokens = match get("UNBIASED_NEWS_ANALYSIS_MAX_TOKENS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("UNBIASED_NEWS_ANALYSIS_MAX_TOKENS is not a number: {}", v))?,
            None => defaults.analysis_max_tokens,
        };

        let comparison_max_tokens = match get("UNBIASED_NEWS_COMPARISON_MAX_TOKENS") {
            Some(v) => v.trim().parse::<u32>().with_context(|| {
                format!("UNBIASED_NEWS_COMPARISON_MAX_TOKENS is not a number: {}", v)
            })?,
            None => defaults.comparison_max_tokens,
        };

        let request_timeout = match get("UNBIASED_NEWS_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .trim()
                    .parse()
                    .with_context(|| format!("UNBIASED_NEWS_TIMEOUT_SECS is not a number: {}", v))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let data_dir = match get("UNBIASED_NEWS_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .context("Could not determine local data directory")?
                .join("unbiased-news"),
        };

        Ok(Self {
            llm: LlmSettings {
                model,
                analysis_max_tokens,
                comparison_max_tokens,
            },
            api_base_url: get("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout,
            data_dir,
            prompts_dir: get("UNBIASED_NEWS_PROMPTS_DIR").map(PathBuf::from),
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/unbiased-news/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("unbiased-news").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}
