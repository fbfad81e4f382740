// crates/schema-sync-service/src/source/file.rs
// ============================================================================
// Module: Schema Sync File Source
// Description: File-backed source for local schema content.
// Purpose: Read schema bytes from local paths or `file://` URIs.
// Dependencies: tokio, url
// ============================================================================

//! ## Overview
//! [`FileSource`] resolves `file://` URIs and bare paths into payload bytes.
//! A root directory can be configured to fail closed on path traversal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::source::FetchRequest;
use crate::source::Source;
use crate::source::SourceError;
use crate::source::SourcePayload;
use crate::source::enforce_max_bytes;

// ============================================================================
// SECTION: File Source
// ============================================================================

/// File-backed payload source.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    /// Optional root directory for path traversal protection.
    root: Option<PathBuf>,
}

impl FileSource {
    /// Creates a file source with no root restrictions.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
        }
    }

    /// Creates a file source rooted at the provided directory.
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Resolves a location into a local path.
    async fn resolve_path(&self, location: &str) -> Result<PathBuf, SourceError> {
        let path = match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|()| {
                SourceError::InvalidUri("failed to map file url to path".to_string())
            })?,
            Ok(url) if url.scheme().len() > 1 => {
                return Err(SourceError::UnsupportedScheme(url.scheme().to_string()));
            }
            _ => PathBuf::from(location),
        };

        if let Some(root) = &self.root {
            let root = tokio::fs::canonicalize(root).await.map_err(map_io_error)?;
            let resolved = tokio::fs::canonicalize(&path).await.map_err(map_io_error)?;
            if !resolved.starts_with(&root) {
                return Err(SourceError::InvalidUri(
                    "file path escapes configured root".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Reads the file after checking its size against the cap.
    async fn read_with_limit(path: &Path) -> Result<Vec<u8>, SourceError> {
        let metadata = tokio::fs::metadata(path).await.map_err(map_io_error)?;
        let declared = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        enforce_max_bytes(declared)?;
        let bytes = tokio::fs::read(path).await.map_err(map_io_error)?;
        enforce_max_bytes(bytes.len())?;
        Ok(bytes)
    }
}

#[async_trait]
impl Source for FileSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<SourcePayload, SourceError> {
        let path = self.resolve_path(&request.location).await?;
        let bytes = Self::read_with_limit(&path).await?;
        Ok(SourcePayload {
            bytes,
            content_type: None,
        })
    }
}

/// Maps I/O failures onto source errors.
fn map_io_error(err: io::Error) -> SourceError {
    if err.kind() == ErrorKind::NotFound {
        SourceError::NotFound(err.to_string())
    } else {
        SourceError::Io(err.to_string())
    }
}

