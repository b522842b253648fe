// SPDX-License-Identifier: MIT

//! Loaders for each [`Source`] kind
//!
//! Every loaded document carries `source` metadata. HTML pages add `title`
//! when the page has one; PDF documents are one per page with a zero-based
//! `page`.

use crate::adk::error::{RagError, Result};
use crate::ingest::source::{extension, Source};
use crate::rag::state::Document;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};

const USER_AGENT: &str = concat!("ragweave/", env!("CARGO_PKG_VERSION"));

pub struct Loader {
    client: Client,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub async fn load(&self, source: &Source) -> Result<Vec<Document>> {
        log::info!("Loading {}", source);
        let docs = match source {
            Source::Url(url) => self.load_url(url).await?,
            Source::TextFile(path) => vec![load_text(path).await?],
            Source::PdfFile(path) => load_pdf(path.clone()).await?,
            Source::PdfDirectory(dir) => load_pdf_directory(dir).await?,
        };
        log::debug!("Loaded {} documents from {}", docs.len(), source);
        Ok(docs)
    }

    async fn load_url(&self, url: &str) -> Result<Vec<Document>> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(RagError::api(url, format!("fetch failed with {}", status)));
        }

        let body = resp.text().await?;
        let page = parse_html(&body);
        let mut doc = Document::new(page.text).with_metadata("source", url);
        if let Some(title) = page.title {
            doc = doc.with_metadata("title", title);
        }
        Ok(vec![doc])
    }
}

async fn load_text(path: &Path) -> Result<Document> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(Document::new(content).with_metadata("source", path.display().to_string()))
}

async fn load_pdf(path: PathBuf) -> Result<Vec<Document>> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || extract_pdf_pages(&path))
        .await
        .map_err(|e| RagError::Pdf {
            path: display,
            message: e.to_string(),
        })?
}

/// `.pdf` files directly inside `dir`, in file name order
async fn load_pdf_directory(dir: &Path) -> Result<Vec<Document>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && extension(&path).as_deref() == Some("pdf") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        log::warn!("No PDF files found in {}", dir.display());
    }

    let mut docs = Vec::new();
    for file in files {
        docs.extend(load_pdf(file).await?);
    }
    Ok(docs)
}

fn extract_pdf_pages(path: &Path) -> Result<Vec<Document>> {
    let pdf_err = |message: String| RagError::Pdf {
        path: path.display().to_string(),
        message,
    };

    let pdf = lopdf::Document::load(path).map_err(|e| pdf_err(e.to_string()))?;
    let pages = pdf.get_pages();
    log::debug!("Extracting text from {} pages of {}", pages.len(), path.display());

    let mut docs = Vec::with_capacity(pages.len());
    for (index, page_num) in pages.keys().enumerate() {
        match pdf.extract_text(&[*page_num]) {
            Ok(text) if !text.trim().is_empty() => docs.push(
                Document::new(text)
                    .with_metadata("source", path.display().to_string())
                    .with_metadata("page", index),
            ),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping page {} of {}: {}", page_num, path.display(), e),
        }
    }

    if docs.is_empty() {
        return Err(pdf_err("no extractable text".to_string()));
    }
    Ok(docs)
}

/// Title and visible body text of an HTML page
#[derive(Debug, PartialEq)]
pub struct HtmlPage {
    pub title: Option<String>,
    pub text: String,
}

pub fn parse_html(html: &str) -> HtmlPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|s| document.select(&s).next().map(|t| clean_text(&t.text().collect::<String>())))
        .filter(|t| !t.is_empty());

    let text = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
        .map(visible_text)
        .unwrap_or_default();

    HtmlPage { title, text }
}

/// Text nodes under `element`, skipping script and style contents
fn visible_text(element: ElementRef) -> String {
    let text = element
        .descendants()
        .filter_map(|node| {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element())
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"));
            if hidden {
                return None;
            }
            node.value().as_text().map(|t| &**t)
        })
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&text)
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
