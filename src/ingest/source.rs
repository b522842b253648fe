// SPDX-License-Identifier: MIT

//! Classification of ingestion inputs

use crate::adk::error::{RagError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// A classified ingestion input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `http://` or `https://` page
    Url(String),
    /// Directory whose `.pdf` files are loaded
    PdfDirectory(PathBuf),
    TextFile(PathBuf),
    PdfFile(PathBuf),
}

impl Source {
    /// Classify a raw source string
    ///
    /// Paths must exist. Anything that is not a URL, a directory, or an
    /// existing `.txt`/`.pdf` file is rejected with the input in the error.
    pub fn classify(input: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(input) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(Source::Url(input.to_string()));
            }
        }

        let path = Path::new(input);
        if path.is_dir() {
            return Ok(Source::PdfDirectory(path.to_path_buf()));
        }
        if path.is_file() {
            match extension(path).as_deref() {
                Some("txt") => return Ok(Source::TextFile(path.to_path_buf())),
                Some("pdf") => return Ok(Source::PdfFile(path.to_path_buf())),
                _ => {}
            }
        }
        Err(RagError::UnsupportedSource(input.to_string()))
    }

    /// Value recorded as `source` metadata on loaded documents
    pub fn location(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::PdfDirectory(p) | Source::TextFile(p) | Source::PdfFile(p) => {
                p.display().to_string()
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Source::Url(_) => "url",
            Source::PdfDirectory(_) => "pdf directory",
            Source::TextFile(_) => "text file",
            Source::PdfFile(_) => "pdf file",
        };
        write!(f, "{} {}", kind, self.location())
    }
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
