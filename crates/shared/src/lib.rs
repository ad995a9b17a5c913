// Public modules
pub mod analyzer;
pub mod comparer;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod reader;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use analyzer::BiasAnalyzer;
pub use comparer::StoryComparer;
pub use config::{Config, LlmSettings};
pub use credentials::{CredentialCheck, CredentialSource, EnvCredential};
pub use error::PipelineError;
pub use llm::{ClaudeClient, ModelInvoker, ModelRequest};
pub use models::{
    Article, BiasResult, ComparisonResult, Direction, Indicator, NewArticle, Story, StorySummary,
};
pub use prompts::{PromptBuilder, PromptTemplates};
pub use reader::{guess_source_from_filename, read_file, scan_folder, ArticleFile};
pub use report::ReportFormatter;
pub use store::ArticleStore;
