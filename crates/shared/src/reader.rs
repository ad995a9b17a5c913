use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};

const MAX_TITLE_CHARS: usize = 200;
const TEXT_WIDTH: usize = 1000;

/// Extensions `read_file` understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["html", "htm", "txt", "pdf"];

// Page chrome dropped before HTML is turned into text
const CHROME_TAGS: &str = "script, style, nav, header, footer, aside";

// Substring -> outlet. Longer keys come first so "foxnews" is not shadowed
// by "fox", and the short "ap" is checked last.
const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("cnn", "CNN"),
    ("foxnews", "Fox News"),
    ("fox", "Fox News"),
    ("bbc", "BBC"),
    ("nytimes", "New York Times"),
    ("nyt", "New York Times"),
    ("washingtonpost", "Washington Post"),
    ("wapo", "Washington Post"),
    ("reuters", "Reuters"),
    ("apnews", "Associated Press"),
    ("msnbc", "MSNBC"),
    ("npr", "NPR"),
    ("wsj", "Wall Street Journal"),
    ("guardian", "The Guardian"),
    ("huffpost", "HuffPost"),
    ("breitbart", "Breitbart"),
    ("politico", "Politico"),
    ("axios", "Axios"),
    ("thehill", "The Hill"),
    ("ap", "Associated Press"),
];

/// Text pulled out of an article file.
#[derive(Debug, Clone)]
pub struct ArticleFile {
    pub title: String,
    pub content: String,
    pub path: PathBuf,
}

pub fn read_file(path: &Path) -> Result<ArticleFile> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = String::from_utf8_lossy(&bytes);

    let (title, content) = match extension.as_str() {
        "html" | "htm" => read_html(&raw)?,
        "txt" => read_txt(&raw),
        "pdf" => read_pdf(&bytes, path)?,
        other => anyhow::bail!(
            "Unsupported file type: .{}. Use .html, .txt, or .pdf",
            other
        ),
    };

    if content.trim().is_empty() {
        anyhow::bail!("No article text found in {}", path.display());
    }

    let title = title.unwrap_or_else(|| file_stem(path));

    Ok(ArticleFile {
        title,
        content,
        path: path.to_path_buf(),
    })
}

fn read_html(html: &str) -> Result<(Option<String>, String)> {
    let document = Html::parse_document(html);

    let title_selector =
        Selector::parse("title").map_err(|e| anyhow::anyhow!("Invalid selector: {:?}", e))?;
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let chrome_selector =
        Selector::parse(CHROME_TAGS).map_err(|e| anyhow::anyhow!("Invalid selector: {:?}", e))?;

    // News sites usually wrap the story in <article>; fall back to <body>
    let mut fragment = None;
    for tag in ["article", "body"] {
        let selector =
            Selector::parse(tag).map_err(|e| anyhow::anyhow!("Invalid selector: {:?}", e))?;
        if let Some(element) = document.select(&selector).next() {
            let mut markup = element.html();
            for chrome in element.select(&chrome_selector) {
                // Nested chrome is already gone with its parent
                markup = markup.replacen(&chrome.html(), "", 1);
            }
            fragment = Some(markup);
            break;
        }
    }
    let fragment = fragment.unwrap_or_else(|| html.to_string());

    let text = html2text::from_read(fragment.as_bytes(), TEXT_WIDTH);

    Ok((title, collapse_blank_lines(&text)))
}

fn read_txt(raw: &str) -> (Option<String>, String) {
    let content = raw.trim().to_string();
    let title = content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().count() < MAX_TITLE_CHARS)
        .map(String::from);
    (title, content)
}

fn read_pdf(bytes: &[u8], path: &Path) -> Result<(Option<String>, String)> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .with_context(|| format!("Failed to read PDF {}", path.display()))?;

    let content = text.trim().to_string();
    if content.is_empty() {
        anyhow::bail!("Could not extract text from PDF. It may be a scanned image.");
    }

    let title = content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().count() <= MAX_TITLE_CHARS)
        .map(String::from);
    Ok((title, content))
}

/// One paragraph per non-empty line, separated by a blank line.
fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Supported article files directly inside `dir`, sorted by name.
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a folder: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read folder: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();

    files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// Guess the outlet from names like "cnn-article.html" or "Fox News - x.txt".
pub fn guess_source_from_filename(filename: &str) -> Option<&'static str> {
    let lower = filename.to_lowercase();
    KNOWN_SOURCES
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_txt_uses_first_line_as_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        fs::write(&path, "\nSenate passes bill\nThe Senate voted 60-40.\n").unwrap();

        let file = read_file(&path).unwrap();
        assert_eq!(file.title, "Senate passes bill");
        assert_eq!(file.content, "Senate passes bill\nThe Senate voted 60-40.");
    }

    #[test]
    fn test_read_txt_long_first_line_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long-one.txt");
        fs::write(&path, "w".repeat(250)).unwrap();

        assert_eq!(read_file(&path).unwrap().title, "long-one");
    }

    #[test]
    fn test_read_html_prefers_article_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            "<html><head><title>Storm hits coast</title></head><body>\
             <nav>Menu</nav><article><p>Winds reached 90 mph.</p><p>Thousands lost power.</p></article>\
             </body></html>",
        )
        .unwrap();

        let file = read_file(&path).unwrap();
        assert_eq!(file.title, "Storm hits coast");
        assert!(file.content.contains("Winds reached 90 mph."));
        assert!(file.content.contains("Thousands lost power."));
        assert!(!file.content.contains("Menu"));
    }

    #[test]
    fn test_read_html_body_fallback_drops_page_chrome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            "<html><head><title>Storm</title><style>p { color: red; }</style></head><body>\
             <nav>Home Sports Weather</nav><header>Site Banner</header>\
             <p>Winds reached 90 mph.</p><script>track();</script>\
             <footer>Copyright 2024</footer><aside>Related links</aside>\
             </body></html>",
        )
        .unwrap();

        let file = read_file(&path).unwrap();
        assert_eq!(file.content, "Winds reached 90 mph.");
    }

    // ==== PDF ====

    fn write_pdf(path: &Path, lines: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new(
                "Td",
                vec![72.into(), (720 - 40 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_read_pdf_extracts_text_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuters-story.pdf");
        write_pdf(&path, &["Storm hits coast", "Winds reached 90 mph."]);

        let file = read_file(&path).unwrap();
        assert!(file.title.contains("Storm hits coast"));
        assert!(file.content.contains("Storm hits coast"));
        assert!(file.content.contains("Winds reached 90 mph."));
        assert_eq!(guess_source_from_filename("reuters-story.pdf"), Some("Reuters"));
    }

    #[test]
    fn test_read_pdf_without_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        write_pdf(&path, &[]);

        let err = read_file(&path).unwrap_err();
        assert!(err.to_string().contains("Could not extract text from PDF"));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        fs::write(&path, "PK").unwrap();

        let err = read_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.HTML", "c.pdf", "notes.md", "d.docx"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let names: Vec<String> = scan_folder(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.HTML", "b.txt", "c.pdf"]);
    }

    #[test]
    fn test_guess_source_from_filename() {
        assert_eq!(guess_source_from_filename("cnn-article.html"), Some("CNN"));
        assert_eq!(guess_source_from_filename("Fox News - headline.txt"), Some("Fox News"));
        assert_eq!(guess_source_from_filename("politico-apple.html"), Some("Politico"));
        assert_eq!(guess_source_from_filename("random.txt"), None);
    }
}
