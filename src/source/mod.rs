//! Data source references
//!
//! A [`SourceReference`] records where an uploaded or fetched data source lives.
//! Both the inference engine and the import executor open it through
//! [`SourceReference::open`], so they read exactly the same bytes the same way.

mod error;

pub use error::SourceError;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delimiters considered when sniffing a source
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Read buffer used in front of every source
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Kind of data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local file (typically a stored upload)
    File,
    /// Remote HTTP(S) URL
    Url,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::File => write!(f, "file"),
            SourceKind::Url => write!(f, "url"),
        }
    }
}

/// Reference to a received data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub kind: SourceKind,
    /// File path or URL
    pub location: String,
    /// Name the caller knows the source by
    pub original_name: String,
    pub received_at: DateTime<Utc>,
    /// Size in bytes, when known up front
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl SourceReference {
    /// Reference a local file, recording its size if the file exists
    pub fn file(path: impl AsRef<Path>, original_name: impl Into<String>) -> Self {
        let path = path.as_ref();
        Self {
            kind: SourceKind::File,
            location: path.display().to_string(),
            original_name: original_name.into(),
            received_at: Utc::now(),
            size_bytes: fs::metadata(path).ok().map(|m| m.len()),
        }
    }

    /// Reference a remote URL
    ///
    /// Only `http` and `https` URLs are accepted.
    pub fn url(url: &str) -> Result<Self, SourceError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| SourceError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SourceError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            kind: SourceKind::Url,
            location: url.to_string(),
            original_name: url.to_string(),
            received_at: Utc::now(),
            size_bytes: None,
        })
    }

    /// Path of a file source
    pub fn path(&self) -> Option<PathBuf> {
        match self.kind {
            SourceKind::File => Some(PathBuf::from(&self.location)),
            SourceKind::Url => None,
        }
    }

    /// Open the source as a byte stream
    ///
    /// URL sources are fetched with a blocking client, so this must not be called
    /// from inside an async task; use `spawn_blocking`.
    pub fn open(&self, timeout: Duration) -> Result<Box<dyn Read + Send>, SourceError> {
        match self.kind {
            SourceKind::File => {
                let file = File::open(&self.location).map_err(|e| SourceError::Open {
                    location: self.location.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Box::new(file))
            }
            SourceKind::Url => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| SourceError::Fetch {
                        url: self.location.clone(),
                        reason: e.to_string(),
                    })?;
                let response = client
                    .get(&self.location)
                    .send()
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| SourceError::Fetch {
                        url: self.location.clone(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(url = %self.location, status = %response.status(), "Fetched source");
                Ok(Box::new(response))
            }
        }
    }
}

/// Wrap a reader in a buffer and pick its delimiter
///
/// The delimiter is sniffed from the first line when `configured` is `None`.
/// Sniffing only peeks at the buffer, so no bytes are consumed.
pub fn prepare_reader<R: Read>(
    reader: R,
    configured: Option<u8>,
) -> std::io::Result<(BufReader<R>, u8)> {
    let mut buffered = BufReader::with_capacity(READ_BUFFER_BYTES, reader);
    let delimiter = match configured {
        Some(d) => d,
        None => sniff_delimiter(buffered.fill_buf()?),
    };
    Ok((buffered, delimiter))
}

/// Pick the most frequent candidate delimiter in the first line
///
/// Comma wins ties and the case where no candidate appears at all.
pub fn sniff_delimiter(prefix: &[u8]) -> u8 {
    let first_line = prefix
        .split(|b| *b == b'\n')
        .next()
        .unwrap_or_default();

    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in CANDIDATE_DELIMITERS {
        let count = first_line.iter().filter(|b| **b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}
