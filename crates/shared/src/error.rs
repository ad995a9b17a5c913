use thiserror::Error;

/// Every way an analysis or comparison run can fail.
///
/// Pipelines never panic or bubble raw transport errors; each stage converts
/// its failure into one of these variants and returns it to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No API credential; carries remediation text for the user.
    #[error("{0}")]
    Configuration(String),

    /// A comparison was requested with fewer than two articles.
    #[error("Need at least 2 articles to compare (got {0})")]
    InsufficientArticles(usize),

    /// Network, HTTP status or response-envelope failure.
    #[error("API call failed: {0}")]
    Transport(String),

    /// The model output could not be parsed into the expected schema.
    #[error("{message}")]
    Parse {
        message: String,
        raw_response: String,
    },

    /// Strict parsing and text fallback both failed.
    #[error("{message}")]
    UnrecoverableParse {
        message: String,
        raw_response: String,
    },
}

impl PipelineError {
    /// Raw model output kept for diagnosis, when the failure was a parse.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            PipelineError::Parse { raw_response, .. }
            | PipelineError::UnrecoverableParse { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}
