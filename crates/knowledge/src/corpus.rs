//! Loading a domain's document folder into chunks.

use crate::chunker::{chunk_id, chunk_text, source_id};
use crate::parser::{parse_file, ContentType};
use crate::types::{BuildOptions, KnowledgeChunk, KnowledgeSource, SkippedFile};
use greenguide_core::AppResult;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Parsed and chunked contents of a document folder.
#[derive(Debug, Default)]
pub struct Corpus {
    pub sources: Vec<KnowledgeSource>,
    pub chunks: Vec<KnowledgeChunk>,
    pub skipped: Vec<SkippedFile>,
    pub bytes_processed: u64,
}

/// Walk `folder` and parse every supported file into chunks.
///
/// Files are visited in sorted order so rebuilding from unchanged documents
/// yields the same chunks. A file that cannot be parsed is logged and
/// recorded in `skipped`; it never aborts the build. A missing folder yields
/// an empty corpus.
pub fn load_corpus(folder: &Path, options: &BuildOptions) -> AppResult<Corpus> {
    let mut corpus = Corpus::default();

    if !folder.is_dir() {
        tracing::warn!("Document folder {:?} does not exist; domain will be empty", folder);
        return Ok(corpus);
    }

    let walker = WalkDir::new(folder)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", folder, e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(folder)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let content_type = ContentType::from_path(path);
        let text = match parse_file(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", relative, e);
                corpus.skipped.push(SkippedFile {
                    path: relative,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let candidates = chunk_text(&text, options.chunk_size, options.chunk_overlap)?;
        let src_id = source_id(&relative);

        tracing::debug!("Parsed {} into {} chunks", relative, candidates.len());

        corpus.bytes_processed += text.len() as u64;
        corpus.chunks.extend(candidates.into_iter().map(|c| KnowledgeChunk {
            id: chunk_id(&relative, c.position, &c.text),
            source_id: src_id.clone(),
            source_path: relative.clone(),
            position: c.position,
            text: c.text,
        }));
        corpus.sources.push(KnowledgeSource {
            id: src_id,
            path: relative,
            content_type: content_type.as_str().to_string(),
            size_bytes: text.len() as u64,
        });
    }

    Ok(corpus)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_folder_is_empty() {
        let temp = TempDir::new().unwrap();
        let corpus = load_corpus(&temp.path().join("absent"), &BuildOptions::default()).unwrap();
        assert!(corpus.sources.is_empty());
        assert!(corpus.chunks.is_empty());
    }

    #[test]
    fn test_loads_supported_files_and_skips_others() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "Olive trees need well drained soil.").unwrap();
        fs::write(temp.path().join("a.md"), "# Irrigation\n\nDrip irrigation saves water.").unwrap();
        fs::write(temp.path().join("c.bin"), [0u8, 1, 2]).unwrap();
        fs::write(temp.path().join("empty.txt"), "   ").unwrap();
        fs::create_dir(temp.path().join(".hidden")).unwrap();
        fs::write(temp.path().join(".hidden/secret.txt"), "ignored").unwrap();

        let corpus = load_corpus(temp.path(), &BuildOptions::default()).unwrap();

        let paths: Vec<&str> = corpus.sources.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.txt"]);
        assert_eq!(corpus.skipped.len(), 2);
        assert!(corpus.chunks.iter().all(|c| !c.text.trim().is_empty()));
        assert!(corpus.bytes_processed > 0);
    }

    #[test]
    fn test_pdf_documents_are_chunked() {
        let temp = TempDir::new().unwrap();
        crate::parser::pdf_fixture::write_pdf(
            &temp.path().join("pests.pdf"),
            &["The olive fruit fly lays eggs inside ripening olives."],
        );

        let corpus = load_corpus(temp.path(), &BuildOptions::default()).unwrap();

        assert!(corpus.skipped.is_empty());
        assert_eq!(corpus.sources.len(), 1);
        assert_eq!(corpus.sources[0].path, "pests.pdf");
        assert_eq!(corpus.sources[0].content_type, "pdf");
        assert!(!corpus.chunks.is_empty());
        assert!(corpus
            .chunks
            .iter()
            .any(|c| c.text.contains("olive fruit fly")));
    }

    #[test]
    fn test_nested_paths_are_relative() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("crops")).unwrap();
        fs::write(temp.path().join("crops/wheat.txt"), "Wheat is sown in autumn.").unwrap();

        let corpus = load_corpus(temp.path(), &BuildOptions::default()).unwrap();
        assert_eq!(corpus.sources[0].path, "crops/wheat.txt");
        assert_eq!(corpus.chunks[0].source_path, "crops/wheat.txt");
    }
}
