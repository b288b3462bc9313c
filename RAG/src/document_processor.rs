use crate::models::*;
use anyhow::{Context, Result};
use pdf_extract::extract_text_from_mem;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

const CHUNK_SIZE: usize = 500;
const CHUNK_OVERLAP: usize = 50;

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static RE_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?;:()\-\[\]{}]").expect("special char pattern"));

/// Raised for uploads whose extension has no text extractor.
#[derive(Debug, thiserror::Error)]
#[error("unsupported file type: {extension}")]
pub struct UnsupportedFileType {
    pub extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Pdf,
    Docx,
    PlainText,
    Email,
}

impl SourceKind {
    fn from_filename(filename: &str) -> Result<Self, UnsupportedFileType> {
        let extension = Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "md" => Ok(Self::PlainText),
            "eml" => Ok(Self::Email),
            _ => Err(UnsupportedFileType { extension }),
        }
    }
}

pub fn is_supported(filename: &str) -> bool {
    SourceKind::from_filename(filename).is_ok()
}

pub struct DocumentProcessor;

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Processes every supported file in `documents_dir`. Files that fail to
    /// extract are logged and skipped.
    pub async fn process_directory(&self, documents_dir: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        if !documents_dir.exists() {
            log::warn!("No documents found in {}", documents_dir.display());
            return Ok(documents);
        }

        let mut entries = tokio::fs::read_dir(documents_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_path = entry.path();
            if !file_path.is_file() {
                continue;
            }
            match self.process_file(&file_path).await {
                Ok(doc) => {
                    log::info!("Processed {} into {} chunks", doc.filename, doc.chunks.len());
                    documents.push(doc);
                }
                Err(e) => log::warn!("Skipping {}: {:#}", file_path.display(), e),
            }
        }

        log::info!("Processed {} documents", documents.len());
        Ok(documents)
    }

    pub async fn process_file(&self, file_path: &Path) -> Result<Document> {
        let filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .with_context(|| format!("{} has no file name", file_path.display()))?;
        // Reject early so unsupported files are never read.
        SourceKind::from_filename(&filename)?;

        let bytes = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("failed to read {}", file_path.display()))?;
        self.process_bytes(&filename, &bytes)
    }

    pub fn process_bytes(&self, filename: &str, bytes: &[u8]) -> Result<Document> {
        log::info!("Extracting text from {}", filename);

        let content = match SourceKind::from_filename(filename)? {
            SourceKind::Pdf => extract_text_from_mem(bytes)
                .with_context(|| format!("failed to extract text from {filename}"))?,
            SourceKind::Docx => docx_text(bytes)
                .with_context(|| format!("failed to extract text from {filename}"))?,
            SourceKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
            SourceKind::Email => email_body(&String::from_utf8_lossy(bytes)).to_string(),
        };
        let chunks = self.create_chunks(&content);

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            content,
            chunks,
        })
    }

    pub fn create_chunks(&self, content: &str) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();

        let cleaned_content = self.clean_text(content);
        let sentences = self.split_into_sentences(&cleaned_content);

        let mut current_chunk = String::new();
        let mut start_pos = 0;

        for sentence in sentences {
            let current_len = current_chunk.chars().count();
            if current_len + sentence.chars().count() > CHUNK_SIZE && !current_chunk.is_empty() {
                chunks.push(new_chunk(&current_chunk, start_pos));

                // Carry the tail of the previous chunk into the next one.
                // Positions index chars of the cleaned text, so the overlap
                // must not start on the separating space.
                let overlap_text: String = if current_len > CHUNK_OVERLAP {
                    current_chunk.chars().skip(current_len - CHUNK_OVERLAP).collect()
                } else {
                    current_chunk.clone()
                };
                let overlap_text = overlap_text.trim_start();

                start_pos += current_len - overlap_text.chars().count();
                current_chunk = if overlap_text.is_empty() {
                    sentence
                } else {
                    format!("{overlap_text} {sentence}")
                };
            } else {
                if !current_chunk.is_empty() {
                    current_chunk.push(' ');
                }
                current_chunk.push_str(&sentence);
            }
        }

        if !current_chunk.trim().is_empty() {
            chunks.push(new_chunk(&current_chunk, start_pos));
        }

        log::debug!("Created {} chunks", chunks.len());
        chunks
    }

    fn clean_text(&self, text: &str) -> String {
        let cleaned = RE_SPECIAL.replace_all(text, " ");
        let cleaned = RE_WHITESPACE.replace_all(&cleaned, " ");

        cleaned.trim().to_string()
    }

    fn split_into_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn new_chunk(text: &str, start_pos: usize) -> DocumentChunk {
    DocumentChunk {
        id: Uuid::new_v4().to_string(),
        content: text.trim().to_string(),
        start_position: start_pos,
        end_position: start_pos + text.chars().count(),
    }
}

/// Paragraph text of a Word document. Runs are concatenated and each
/// `w:p` ends a line; tabs and breaks become spaces.
fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("not a docx archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("docx has no word/document.xml")?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::Text(e) if in_text => text.push_str(&e.unescape()?),
            Event::Empty(e) if matches!(e.name().as_ref(), b"w:tab" | b"w:br") => text.push(' '),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Body of an RFC 822 message: everything after the first blank line.
fn email_body(raw: &str) -> &str {
    let raw = raw.trim_start_matches('\u{feff}');
    for separator in ["\r\n\r\n", "\n\n"] {
        if let Some(idx) = raw.find(separator) {
            return raw[idx + separator.len()..].trim();
        }
    }
    raw.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let processor = DocumentProcessor::new();
        let chunks = processor.create_chunks("Knee surgery is covered. Waiting period is 24 months.");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_position, 0);
        assert!(chunks[0].content.contains("Waiting period is 24 months."));
    }

    #[test]
    fn chunk_positions_index_the_cleaned_text() {
        let processor = DocumentProcessor::new();
        let text = (1..=30)
            .map(|n| format!("Clause {n} limits room rent to {n} percent of the sum insured."))
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned = processor.clean_text(&text);

        let chunks = processor.create_chunks(&text);

        assert!(chunks.len() > 2);
        for chunk in &chunks {
            let slice: String = cleaned
                .chars()
                .skip(chunk.start_position)
                .take(chunk.end_position - chunk.start_position)
                .collect();
            assert_eq!(slice, chunk.content);
        }
    }

    #[test]
    fn long_text_is_split_with_overlap() {
        let processor = DocumentProcessor::new();
        let sentence = "The insured person is entitled to reimbursement of hospitalisation expenses. ";
        let text = sentence.repeat(20);

        let chunks = processor.create_chunks(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= CHUNK_SIZE + CHUNK_OVERLAP + sentence.len());
        }
        assert!(chunks[1].start_position > 0);
        assert!(chunks[1].start_position < chunks[0].end_position);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(DocumentProcessor::new().create_chunks("   ").is_empty());
    }

    #[test]
    fn email_body_skips_headers() {
        let raw = "From: a@example.com\r\nSubject: claim\r\n\r\nPlease cover my cataract surgery.\r\n";
        assert_eq!(email_body(raw), "Please cover my cataract surgery.");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = DocumentProcessor::new()
            .process_bytes("rates.xlsx", b"PK")
            .unwrap_err();
        let unsupported = err.downcast_ref::<UnsupportedFileType>().unwrap();
        assert_eq!(unsupported.extension, "xlsx");
        assert!(!is_supported("archive"));
        assert!(is_supported("Policy.PDF"));
        assert!(is_supported("wording.docx"));
    }

    fn docx_with_body(body: &str) -> Vec<u8> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "word/document.xml",
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored),
            )
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn docx_paragraphs_are_extracted() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Organ donor expenses</w:t></w:r><w:r><w:t xml:space=\"preserve\"> are covered &amp; payable.</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Grace</w:t><w:tab/><w:t>period is 30 days.</w:t></w:r></w:p>",
        );

        let doc = DocumentProcessor::new().process_bytes("wording.docx", &bytes).unwrap();

        assert_eq!(
            doc.content,
            "Organ donor expenses are covered & payable.\nGrace period is 30 days.\n"
        );
        assert_eq!(doc.chunks.len(), 1);
    }

    #[test]
    fn corrupt_docx_is_an_error() {
        let err = DocumentProcessor::new()
            .process_bytes("wording.docx", b"not a zip archive")
            .unwrap_err();
        assert!(err.downcast_ref::<UnsupportedFileType>().is_none());
    }

    #[test]
    fn plain_text_is_processed() {
        let doc = DocumentProcessor::new()
            .process_bytes("notes.txt", b"Maternity expenses are excluded.")
            .unwrap();
        assert_eq!(doc.filename, "notes.txt");
        assert_eq!(doc.chunks.len(), 1);
    }
}
