use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::prompts::truncate_chars;
use shared::{
    guess_source_from_filename, read_file, scan_folder, Article, ArticleStore, BiasAnalyzer,
    ClaudeClient, Config, CredentialSource, EnvCredential, ModelInvoker, NewArticle,
    PipelineError, PromptBuilder, PromptTemplates, ReportFormatter, StoryComparer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod input;

#[derive(Parser)]
#[command(name = "unbiased-news")]
#[command(about = "Compare news articles and detect bias")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new article by pasting its text
    Add,
    /// Import articles from a file or folder (.html, .htm, .txt, .pdf)
    Import { path: PathBuf },
    /// List all saved articles
    List,
    /// View a specific article by ID
    View { id: String },
    /// Delete an article by ID
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Analyze an article for bias using Claude
    Analyze {
        id: String,
        /// Re-analyze without asking, even if a result is stored
        #[arg(short, long)]
        force: bool,
    },
    /// Analyze every article that has not been analyzed yet
    AnalyzeAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Compare all articles in a story and generate a balanced summary
    Compare { story_id: String },
    /// Compare specific articles by their IDs
    CompareArticles { ids: Vec<String> },
    /// List all story groups
    Stories,
    /// View all articles in a story group
    Story { id: String },
}

struct App {
    store: ArticleStore,
    analyzer: BiasAnalyzer,
    comparer: StoryComparer,
}

impl App {
    fn new(config: &Config) -> Result<Self> {
        let store = ArticleStore::open(&config.data_dir)?;
        let prompts = PromptBuilder::new(PromptTemplates::load(config.prompts_dir.as_deref())?);

        let invoker: Arc<dyn ModelInvoker> = Arc::new(ClaudeClient::new(
            &config.api_base_url,
            config.request_timeout,
        )?);
        let credentials: Arc<dyn CredentialSource> = Arc::new(EnvCredential::default());

        Ok(Self {
            store,
            analyzer: BiasAnalyzer::new(
                invoker.clone(),
                credentials.clone(),
                prompts.clone(),
                config.llm.clone(),
            ),
            comparer: StoryComparer::new(invoker, credentials, prompts, config.llm.clone()),
        })
    }

    // ==================== Articles ====================

    fn add(&self) -> Result<()> {
        println!("\n📰 Add a New Article\n");

        let title = input::prompt("Article headline/title", None)?;
        if title.is_empty() {
            println!("✗ No title provided. Article not saved.");
            return Ok(());
        }
        let source = input::prompt("News source", Some("Unknown"))?;

        println!("\nTip: Paste the article text below. When done, press Enter twice on an empty line.\n");
        println!("Article content (paste below):");
        let content = input::read_multiline()?;
        if content.is_empty() {
            println!("✗ No content provided. Article not saved.");
            return Ok(());
        }

        let url = Some(input::prompt("URL (optional)", None)?).filter(|u| !u.is_empty());
        let story_id = self.ask_story_selection(false)?;

        let article = self.store.add_article(NewArticle {
            title,
            source,
            content,
            url,
            story_id,
        })?;

        println!("\n✓ Article saved! ID: {}", article.id);
        println!("  Title: {}", article.title);
        println!("  Source: {}", article.source);
        println!("  Content: {} characters", article.content.chars().count());

        Ok(())
    }

    fn import(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            println!("✗ Path not found: {}", path.display());
            return Ok(());
        }

        if path.is_file() {
            self.import_file(path)
        } else {
            self.import_folder(path)
        }
    }

    fn import_file(&self, path: &Path) -> Result<()> {
        println!("\n📥 Importing file: {}\n", path.display());

        let file = match read_file(path) {
            Ok(file) => file,
            Err(e) => {
                println!("✗ Error: {:#}", e);
                return Ok(());
            }
        };

        println!("Title found: {}", file.title);
        println!("Content preview:\n{}\n", short_text(&file.content, 300));

        let source = match guess_source_from_filename(&file_name(path)) {
            Some(guess) => input::prompt("News source", Some(guess))?,
            None => input::prompt("News source (e.g., CNN, Fox News, BBC)", Some("Unknown"))?,
        };
        let title = input::prompt("Article title", Some(&file.title))?;
        let story_id = self.ask_story_selection(true)?;

        let article = self.store.add_article(NewArticle {
            title,
            source,
            content: file.content,
            url: None,
            story_id,
        })?;

        println!("\n✓ Article imported! ID: {}", article.id);
        Ok(())
    }

    fn import_folder(&self, dir: &Path) -> Result<()> {
        println!("\n📂 Scanning folder: {}\n", dir.display());

        let files = scan_folder(dir)?;
        if files.is_empty() {
            println!("No article files found.");
            println!("Supported formats: .html, .htm, .txt, .pdf");
            return Ok(());
        }

        println!("Found {} file(s):\n", files.len());
        for (i, path) in files.iter().enumerate() {
            println!("  {}) {}", i + 1, file_name(path));
        }
        println!();

        if !input::confirm("Import all these files?", true)? {
            println!("Cancelled.");
            return Ok(());
        }

        println!("\nGroup all these articles into a story?");
        let story_id = self.ask_story_selection(true)?;

        let mut imported = 0;
        for path in &files {
            let name = file_name(path);
            println!("\nProcessing: {}", name);

            let file = match read_file(path) {
                Ok(file) => file,
                Err(e) => {
                    println!("  ✗ Skipped: {:#}", e);
                    continue;
                }
            };

            let source = match guess_source_from_filename(&name) {
                Some(guess) => guess.to_string(),
                None => input::prompt(&format!("  Source for {}", name), Some("Unknown"))?,
            };

            self.store.add_article(NewArticle {
                title: file.title.clone(),
                source: source.clone(),
                content: file.content,
                url: None,
                story_id: story_id.clone(),
            })?;

            println!("  ✓ Imported - {}: {}", source, short_text(&file.title, 40));
            imported += 1;
        }

        println!("\n✅ Done! Imported {} article(s).\n", imported);
        Ok(())
    }

    fn list(&self) -> Result<()> {
        let articles = self.store.load_articles()?;
        if articles.is_empty() {
            println!("\nNo articles saved yet.");
            println!("Use 'unbiased-news add' to add your first article.\n");
            return Ok(());
        }

        let stories = self.store.load_stories()?;

        println!(
            "\n{:<10} {:<53} {:<20} {:<20} Story",
            "ID", "Title", "Source", "Bias"
        );
        for article in &articles {
            let story = article
                .story_id
                .as_deref()
                .and_then(|id| stories.iter().find(|s| s.id == id))
                .map(|s| truncate_chars(&s.name, 20).to_string())
                .unwrap_or_else(|| "—".to_string());

            println!(
                "{:<10} {:<53} {:<20} {:<20} {}",
                article.id,
                short_text(&article.title, 50),
                article.source,
                bias_label(article),
                story
            );
        }
        println!();

        Ok(())
    }

    fn view(&self, id: &str) -> Result<()> {
        let Some(article) = self.store.get_article(id)? else {
            println!("✗ Article not found: {}", id);
            return Ok(());
        };

        println!("\n{}", article.title);
        println!("Source: {} | ID: {}", article.source, article.id);
        if let Some(url) = &article.url {
            println!("URL: {}", url);
        }
        println!("{}", "-".repeat(60));

        let preview = truncate_chars(&article.content, 1000);
        println!("{}", preview);
        if preview.len() < article.content.len() {
            println!("\n... (truncated)");
        }

        match article.prior_analysis() {
            Some(analysis) => println!("\n{}", ReportFormatter::format_analysis(&analysis)),
            None => println!("\nBias analysis not yet performed. Use 'analyze' command."),
        }
        println!();

        Ok(())
    }

    fn delete(&self, id: &str, yes: bool) -> Result<()> {
        let Some(article) = self.store.get_article(id)? else {
            println!("✗ Article not found: {}", id);
            return Ok(());
        };

        if yes || input::confirm(&format!("Delete article '{}'?", article.title), false)? {
            self.store.delete_article(id)?;
            println!("✓ Article deleted.");
        }

        Ok(())
    }

    // ==================== Analysis ====================

    async fn analyze(&self, id: &str, force: bool) -> Result<()> {
        let Some(article) = self.store.get_article(id)? else {
            println!("✗ Article not found: {}", id);
            return Ok(());
        };

        if article.is_analyzed()
            && !force
            && !input::confirm("This article has already been analyzed. Re-analyze?", false)?
        {
            if let Some(previous) = article.prior_analysis() {
                println!("\nPrevious Analysis:");
                println!("{}", ReportFormatter::format_analysis(&previous));
            }
            return Ok(());
        }

        println!("\n🔍 Analyzing article: {}", article.title);
        println!("   Source: {}", article.source);
        println!("\n🤖 Sending to Claude for analysis...");

        let outcome = self.analyzer.analyze(&article).await;
        match &outcome {
            Ok(result) => {
                self.store.record_analysis(&article.id, result)?;
                println!("\n✅ Analysis Complete!");
            }
            Err(e) => log_raw_response(e),
        }
        println!("\n{}\n", ReportFormatter::format_analysis_outcome(&outcome));

        Ok(())
    }

    async fn analyze_all(&self, yes: bool) -> Result<()> {
        let unanalyzed = self.store.unanalyzed_articles()?;
        if unanalyzed.is_empty() {
            println!("\n✓ All articles have already been analyzed!\n");
            return Ok(());
        }

        println!("\nFound {} unanalyzed article(s)\n", unanalyzed.len());
        if !yes && !input::confirm("Analyze all of them?", false)? {
            return Ok(());
        }

        let total = unanalyzed.len();
        let mut failed = 0;

        // One at a time; a failed article does not stop the batch
        for (i, article) in unanalyzed.iter().enumerate() {
            println!(
                "\n({}/{}) Analyzing: {}",
                i + 1,
                total,
                short_text(&article.title, 50)
            );

            match self.analyzer.analyze(article).await {
                Ok(result) => {
                    self.store.record_analysis(&article.id, &result)?;
                    let score = result
                        .score()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    println!("  ✓ Done! Score: {}/100 ({})", score, result.direction());
                }
                Err(e) => {
                    failed += 1;
                    println!("  ✗ Error: {}", short_text(&e.to_string(), 100));
                }
            }
        }

        println!(
            "\n✅ All analyses complete! ({} succeeded, {} failed)\n",
            total - failed,
            failed
        );
        Ok(())
    }

    // ==================== Comparison ====================

    async fn compare(&self, story_id: &str) -> Result<()> {
        let Some(story) = self.store.get_story(story_id)? else {
            println!("✗ Story not found: {}", story_id);
            return Ok(());
        };

        let articles = self.store.story_articles(story_id)?;
        if articles.len() < 2 {
            println!("\nNeed at least 2 articles to compare.");
            println!("This story has {} article(s).", articles.len());
            println!("Add more articles to this story using 'unbiased-news add'\n");
            return Ok(());
        }

        println!("\n⚖️  Comparing {} articles on: {}\n", articles.len(), story.name);
        self.run_comparison(&articles).await;
        Ok(())
    }

    async fn compare_articles(&self, ids: &[String]) -> Result<()> {
        if ids.len() < 2 {
            println!("Please provide at least 2 article IDs to compare.");
            println!("Example: unbiased-news compare-articles abc123 def456");
            return Ok(());
        }

        let mut articles = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get_article(id)? {
                Some(article) => articles.push(article),
                None => {
                    println!("✗ Article not found: {}", id);
                    return Ok(());
                }
            }
        }

        println!("\n⚖️  Comparing {} articles\n", articles.len());
        self.run_comparison(&articles).await;
        Ok(())
    }

    async fn run_comparison(&self, articles: &[Article]) {
        for article in articles {
            let bias = article
                .bias_score
                .map(|s| format!(" (Bias: {})", s))
                .unwrap_or_default();
            println!(
                "  • {}: {}{}",
                article.source,
                short_text(&article.title, 50),
                bias
            );
        }

        println!("\n🤖 Generating balanced comparison...");

        let outcome = self.comparer.compare(articles).await;
        match &outcome {
            Ok(_) => {
                println!("\n{}", "=".repeat(60));
                println!("BALANCED COMPARISON");
                println!("{}", "=".repeat(60));
            }
            Err(e) => log_raw_response(e),
        }
        println!("\n{}\n", ReportFormatter::format_comparison_outcome(&outcome));
    }

    // ==================== Stories ====================

    fn stories(&self) -> Result<()> {
        let stories = self.store.list_stories_with_counts()?;
        if stories.is_empty() {
            println!("\nNo stories created yet.");
            println!("Stories are created when you add articles.\n");
            return Ok(());
        }

        println!("\n{:<10} {:<40} {:<9} Created", "ID", "Name", "Articles");
        for summary in &stories {
            println!(
                "{:<10} {:<40} {:<9} {}",
                summary.story.id,
                summary.story.name,
                summary.article_count,
                truncate_chars(&summary.story.created_at, 10)
            );
        }
        println!();

        Ok(())
    }

    fn story(&self, id: &str) -> Result<()> {
        let Some(story) = self.store.get_story(id)? else {
            println!("✗ Story not found: {}", id);
            return Ok(());
        };

        let articles = self.store.story_articles(id)?;

        println!("\n📰 Story: {}", story.name);
        if let Some(description) = &story.description {
            println!("{}", description);
        }
        println!();

        if articles.is_empty() {
            println!("No articles in this story yet.\n");
            return Ok(());
        }

        for article in &articles {
            println!("{} - {}", article.source, article.title);
            println!("  ID: {} | Bias: {}", article.id, bias_label(article));
            println!();
        }

        Ok(())
    }

    fn ask_story_selection(&self, create_by_default: bool) -> Result<Option<String>> {
        let stories = self.store.list_stories_with_counts()?;

        if stories.is_empty() {
            if input::confirm("Create a story group?", create_by_default)? {
                return self.create_story().map(Some);
            }
            return Ok(None);
        }

        println!("\nLink to a story?");
        for (i, summary) in stories.iter().enumerate() {
            println!(
                "  {}) {} ({} articles)",
                i + 1,
                summary.story.name,
                summary.article_count
            );
        }
        let create_option = stories.len() + 1;
        let skip_option = stories.len() + 2;
        println!("  {}) Create new story", create_option);
        println!("  {}) No story (standalone)", skip_option);

        let choice = input::prompt("Choose option", Some(&skip_option.to_string()))?;
        match choice.parse::<usize>() {
            Ok(n) if (1..=stories.len()).contains(&n) => Ok(Some(stories[n - 1].story.id.clone())),
            Ok(n) if n == create_option => self.create_story().map(Some),
            _ => Ok(None),
        }
    }

    fn create_story(&self) -> Result<String> {
        let name = input::prompt("New story name", Some("Untitled story"))?;
        let story = self.store.create_story(&name, None)?;
        println!("✓ Created story: {}", story.name);
        Ok(story.id)
    }
}

fn log_raw_response(error: &PipelineError) {
    if let Some(raw) = error.raw_response() {
        tracing::debug!(raw_response = raw, "Unparsed model response");
    }
}

fn bias_label(article: &Article) -> String {
    match article.prior_analysis() {
        Some(analysis) => match analysis.score() {
            Some(score) => format!("{} ({})", score, analysis.direction()),
            None => format!("? ({})", analysis.direction()),
        },
        None => "Not analyzed".to_string(),
    }
}

fn short_text(text: &str, max: usize) -> String {
    let shown = truncate_chars(text, max);
    if shown.len() < text.len() {
        format!("{}...", shown)
    } else {
        text.to_string()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let app = App::new(&config)?;

    match args.command {
        Command::Add => app.add(),
        Command::Import { path } => app.import(&path),
        Command::List => app.list(),
        Command::View { id } => app.view(&id),
        Command::Delete { id, yes } => app.delete(&id, yes),
        Command::Analyze { id, force } => app.analyze(&id, force).await,
        Command::AnalyzeAll { yes } => app.analyze_all(yes).await,
        Command::Compare { story_id } => app.compare(&story_id).await,
        Command::CompareArticles { ids } => app.compare_articles(&ids).await,
        Command::Stories => app.stories(),
        Command::Story { id } => app.story(&id),
    }
}
