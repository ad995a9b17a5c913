use std::env;

use crate::error::PipelineError;

/// Environment variable holding the Anthropic API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Result of checking whether a credential is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    pub configured: bool,
    pub message: String,
}

/// Resolves the API credential from process-wide configuration.
///
/// Implementations must not cache: a key exported after startup is picked up
/// on the next pipeline run.
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<String>;

    fn check_credential(&self) -> CredentialCheck {
        if self.credential().is_some() {
            CredentialCheck {
                configured: true,
                message: "API key configured".to_string(),
            }
        } else {
            CredentialCheck {
                configured: false,
                message: missing_key_message(),
            }
        }
    }

    /// Check, then resolve, the credential. Pipelines call this before any
    /// network request.
    fn require_credential(&self) -> Result<String, PipelineError> {
        let check = self.check_credential();
        if !check.configured {
            return Err(PipelineError::Configuration(check.message));
        }
        self.credential()
            .ok_or_else(|| PipelineError::Configuration(missing_key_message()))
    }
}

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(API_KEY_VAR)
    }
}

impl CredentialSource for EnvCredential {
    fn credential(&self) -> Option<String> {
        env::var(&self.var).ok().filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticCredential(pub Option<String>);

#[cfg(test)]
impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<String> {
        self.0.clone()
    }
}

fn missing_key_message() -> String {
    format!(
        "No Anthropic API key found!\n\n\
        To use bias analysis and comparison, set your API key:\n\n\
        Option 1 - Set it for this session:\n  \
        export {var}='your-key-here'\n\n\
        Option 2 - Create ~/.config/unbiased-news/.env with:\n  \
        {var}=your-key-here\n\n\
        Get an API key at: https://console.anthropic.com/settings/keys",
        var = API_KEY_VAR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_reports_remediation() {
        let check = StaticCredential(None).check_credential();
        assert!(!check.configured);
        assert!(check.message.contains("export ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_require_credential_returns_configuration_error() {
        let err = StaticCredential(None).require_credential().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_require_credential_returns_key() {
        let source = StaticCredential(Some("sk-test".to_string()));
        assert!(source.check_credential().configured);
        assert_eq!(source.require_credential().unwrap(), "sk-test");
    }

    #[test]
    fn test_env_credential_ignores_blank_values() {
        let var = "UNBIASED_NEWS_TEST_BLANK_KEY";
        env::set_var(var, "   ");
        assert!(EnvCredential::new(var).credential().is_none());
        env::remove_var(var);
    }
}
