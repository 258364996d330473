//! Document loading: heterogeneous inputs to plain text.
//!
//! Accepts uploaded files (pdf, docx, txt, markdown, doc) and URLs, and
//! produces plain-text bodies tagged with a stable source identifier.
//! Failures are isolated per input; a bad item never aborts its siblings.
//! Re-ingesting an already-known source identifier is a no-op.

use crate::types::LoadError;
use scraper::{Html, Node};
use std::collections::HashSet;
use std::io::Read;
use std::time::Duration;

/// Maximum decompressed bytes read from a single OOXML archive entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Supported file format discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Txt,
    Markdown,
}

impl DocumentFormat {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::Doc),
            "txt" | "text" => Some(DocumentFormat::Txt),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }

    /// Derive the format tag from a filename extension.
    pub fn tag_from_filename(name: &str) -> String {
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// One ingestion input: an uploaded file or a URL to scrape.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    File {
        name: String,
        /// Format tag; unknown tags fail that input with `UnsupportedFormat`.
        format: String,
        bytes: Vec<u8>,
    },
    Url(String),
}

impl DocumentInput {
    /// Stable source identifier: the filename or the URL string.
    pub fn source_id(&self) -> &str {
        match self {
            DocumentInput::File { name, .. } => name,
            DocumentInput::Url(url) => url,
        }
    }
}

/// A successfully loaded source with its extracted plain-text body.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source_id: String,
    pub text: String,
}

/// Per-input result of a loading batch.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadedDocument),
    /// Source identifier was already ingested this session.
    Skipped(String),
    Failed {
        source_id: String,
        error: LoadError,
    },
}

pub struct DocumentLoader {
    http: reqwest::Client,
}

impl DocumentLoader {
    pub fn new() -> crate::types::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                crate::types::AppError::Internal(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http })
    }

    /// Load a batch of inputs, suppressing duplicates against
    /// `known_sources` and isolating per-item failures.
    pub async fn load(
        &self,
        inputs: Vec<DocumentInput>,
        known_sources: &mut HashSet<String>,
    ) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::with_capacity(inputs.len());

        for input in inputs {
            let source_id = input.source_id().to_string();

            if known_sources.contains(&source_id) {
                outcomes.push(LoadOutcome::Skipped(source_id));
                continue;
            }

            match self.load_input(&input).await {
                Ok(text) => {
                    known_sources.insert(source_id.clone());
                    outcomes.push(LoadOutcome::Loaded(LoadedDocument { source_id, text }));
                }
                Err(error) => {
                    tracing::warn!(source = %source_id, error = %error, "Failed to load source");
                    outcomes.push(LoadOutcome::Failed { source_id, error });
                }
            }
        }

        outcomes
    }

    async fn load_input(&self, input: &DocumentInput) -> Result<String, LoadError> {
        match input {
            DocumentInput::File { format, bytes, .. } => {
                let format = DocumentFormat::from_tag(format)
                    .ok_or_else(|| LoadError::UnsupportedFormat(format.clone()))?;
                extract_file(format, bytes)
            }
            DocumentInput::Url(url) => self.fetch_url(url).await,
        }
    }

    /// Fetch a URL and reduce the response body to text. Network errors and
    /// non-success statuses are `FetchFailed`; no automatic retry.
    async fn fetch_url(&self, url: &str) -> Result<String, LoadError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::FetchFailed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::FetchFailed(format!("{}: HTTP {}", url, status)));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::FetchFailed(format!("{}: {}", url, e)))?;

        if is_html || body.trim_start().starts_with('<') {
            Ok(html_to_text(&body))
        } else {
            Ok(body)
        }
    }
}

/// Extract the plain-text body from file bytes.
fn extract_file(format: DocumentFormat, bytes: &[u8]) -> Result<String, LoadError> {
    match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| LoadError::ParseFailed(format!("PDF: {}", e))),
        // Both Word formats go through the OOXML path; genuine pre-OOXML
        // .doc binaries are not ZIP containers and surface as ParseFailed.
        DocumentFormat::Docx | DocumentFormat::Doc => extract_docx(bytes),
        DocumentFormat::Txt | DocumentFormat::Markdown => String::from_utf8(bytes.to_vec())
            .map_err(|e| LoadError::ParseFailed(format!("invalid UTF-8: {}", e))),
    }
}

/// Pull the `w:t` text runs out of `word/document.xml`, one line per
/// paragraph.
fn extract_docx(bytes: &[u8]) -> Result<String, LoadError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| LoadError::ParseFailed(format!("OOXML: {}", e)))?;

    let mut xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|e| LoadError::ParseFailed(format!("OOXML: {}", e)))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut xml)
            .map_err(|e| LoadError::ParseFailed(format!("OOXML: {}", e)))?;
        if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(LoadError::ParseFailed(
                "word/document.xml exceeds size limit".to_string(),
            ));
        }
    }

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut out = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                in_text = true;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(t)) if in_text => {
                out.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(LoadError::ParseFailed(format!("OOXML: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

/// Reduce an HTML document to its visible text, dropping script/style.
fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.tree.nodes() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|a| {
                matches!(
                    a.value(),
                    Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript")
                )
            });
            if !hidden {
                out.push_str(&text.text);
                out.push('\n');
            }
        }
    }

    let lines: Vec<&str> = out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    lines.join("\n")
}
