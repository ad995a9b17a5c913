use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::models::{Article, BiasResult, NewArticle, Story, StorySummary};

const ARTICLES_FILE: &str = "articles.json";
const STORIES_FILE: &str = "stories.json";

/// Flat JSON store for articles and story groups.
///
/// Every operation reads the file fresh and rewrites it whole; there is no
/// locking, so one process at a time.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    // ==================== Articles ====================

    pub fn load_articles(&self) -> Result<Vec<Article>> {
        self.read_list(ARTICLES_FILE)
    }

    pub fn add_article(&self, new: NewArticle) -> Result<Article> {
        let mut articles = self.load_articles()?;

        let article = Article {
            id: short_id(),
            title: new.title,
            source: new.source,
            content: new.content,
            url: new.url,
            story_id: new.story_id,
            added_at: chrono::Local::now().to_rfc3339(),
            bias_score: None,
            bias_direction: None,
            key_indicators: None,
            bias_analysis: None,
        };

        articles.push(article.clone());
        self.write_list(ARTICLES_FILE, &articles)?;
        tracing::debug!(id = %article.id, "Added article");

        Ok(article)
    }

    pub fn get_article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.load_articles()?.into_iter().find(|a| a.id == id))
    }

    /// Returns whether an article was removed.
    pub fn delete_article(&self, id: &str) -> Result<bool> {
        let mut articles = self.load_articles()?;
        let before = articles.len();
        articles.retain(|a| a.id != id);

        if articles.len() == before {
            return Ok(false);
        }
        self.write_list(ARTICLES_FILE, &articles)?;
        Ok(true)
    }

    /// Persist an analysis onto the stored article.
    pub fn record_analysis(&self, id: &str, analysis: &BiasResult) -> Result<()> {
        let mut articles = self.load_articles()?;
        let article = articles
            .iter_mut()
            .find(|a| a.id == id)
            .with_context(|| format!("Article not found: {}", id))?;

        article.bias_score = analysis.score();
        article.bias_direction = Some(analysis.direction().to_string());
        article.key_indicators = Some(analysis.indicators().to_vec());
        article.bias_analysis = Some(analysis.assessment().to_string());

        self.write_list(ARTICLES_FILE, &articles)
    }

    pub fn unanalyzed_articles(&self) -> Result<Vec<Article>> {
        Ok(self
            .load_articles()?
            .into_iter()
            .filter(|a| !a.is_analyzed())
            .collect())
    }

    // ==================== Stories ====================

    pub fn load_stories(&self) -> Result<Vec<Story>> {
        self.read_list(STORIES_FILE)
    }

    pub fn create_story(&self, name: &str, description: Option<String>) -> Result<Story> {
        let mut stories = self.load_stories()?;

        let story = Story {
            id: short_id(),
            name: name.to_string(),
            description,
            created_at: chrono::Local::now().to_rfc3339(),
        };

        stories.push(story.clone());
        self.write_list(STORIES_FILE, &stories)?;

        Ok(story)
    }

    pub fn get_story(&self, id: &str) -> Result<Option<Story>> {
        Ok(self.load_stories()?.into_iter().find(|s| s.id == id))
    }

    pub fn story_articles(&self, story_id: &str) -> Result<Vec<Article>> {
        Ok(self
            .load_articles()?
            .into_iter()
            .filter(|a| a.story_id.as_deref() == Some(story_id))
            .collect())
    }

    pub fn list_stories_with_counts(&self) -> Result<Vec<StorySummary>> {
        let articles = self.load_articles()?;

        Ok(self
            .load_stories()?
            .into_iter()
            .map(|story| {
                let article_count = articles
                    .iter()
                    .filter(|a| a.story_id.as_deref() == Some(story.id.as_str()))
                    .count();
                StorySummary {
                    story,
                    article_count,
                }
            })
            .collect())
    }

    // ==================== File I/O ====================

    fn read_list<T: DeserializeOwned>(&self, filename: &str) -> Result<Vec<T>> {
        let filepath = self.dir.join(filename);
        if !filepath.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&filepath)
            .with_context(|| format!("Failed to read {}", filepath.display()))?;

        serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse {}. The file may be corrupted.",
                filepath.display()
            )
        })
    }

    fn write_list<T: Serialize>(&self, filename: &str, items: &[T]) -> Result<()> {
        let filepath = self.dir.join(filename);
        let json = serde_json::to_string_pretty(items)
            .with_context(|| format!("Failed to serialize {}", filename))?;

        fs::write(&filepath, json)
            .with_context(|| format!("Failed to write {}", filepath.display()))
    }
}

/// Short unique id like "a1b2c3d4".
fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
