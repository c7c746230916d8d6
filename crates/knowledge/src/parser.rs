//! Source file parsing and text extraction.
//!
//! Every failure here is an ingestion failure: the corpus walk logs it and
//! moves on to the next file.

use greenguide_core::{AppError, AppResult};
use lopdf::Document;
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Markdown,
    Html,
    PlainText,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("txt") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);

    let text = match content_type {
        ContentType::Pdf => extract_pdf_text(path)?,
        ContentType::Markdown => clean_markdown(&read_text(path)?),
        ContentType::Html => clean_html(&read_text(path)?),
        ContentType::PlainText => read_text(path)?,
        ContentType::Unsupported => {
            return Err(AppError::Ingestion(format!(
                "Unsupported file type: {}",
                path.display()
            )));
        }
    };

    if text.trim().is_empty() {
        return Err(AppError::Ingestion(format!(
            "No readable text in {}",
            path.display()
        )));
    }

    Ok(text)
}

fn read_text(path: &Path) -> AppResult<String> {
    let raw = fs::read(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read {}: {}", path.display(), e)))?;

    String::from_utf8(raw)
        .map_err(|_| AppError::Ingestion(format!("Not valid UTF-8 text: {}", path.display())))
}

/// Extract text page by page, joining pages with blank lines.
fn extract_pdf_text(path: &Path) -> AppResult<String> {
    let document = Document::load(path).map_err(|e| {
        AppError::Ingestion(format!("Failed to parse PDF {}: {}", path.display(), e))
    })?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        match document.extract_text(&[page_no]) {
            Ok(text) if !text.trim().is_empty() => pages.push(text),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), page_no, error = %e, "Skipping unreadable PDF page");
            }
        }
    }

    Ok(pages.join("\n\n"))
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags, scripts and styles.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut skip_content = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;
            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") || starts_with_ignore_case(rest, "<style") {
                skip_content = true;
            } else if starts_with_ignore_case(rest, "</script")
                || starts_with_ignore_case(rest, "</style")
            {
                skip_content = false;
            }
        } else if ch == '>' {
            in_tag = false;
            result.push(' ');
        } else if !in_tag && !skip_content {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
