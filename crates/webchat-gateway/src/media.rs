// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media bridge between served `/uploads/` URLs and files under the upload root.
//!
//! - Uploads are size-checked before anything touches the disk, then written
//!   to `<upload_root>/<filename>`, replacing any file of the same name.
//! - Downloads pick inline or attachment disposition from the MIME type.
//! - Outbound media (bus -> browser): local paths are copied into the upload
//!   root and become served URLs; unusable paths are dropped with a warning.
//! - Inbound media (browser -> bus): served URLs become absolute paths.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use webchat_core::WebChatError;

/// URL prefix under which uploaded files are served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// MIME prefixes browsers render natively.
const INLINE_MIME_PREFIXES: &[&str] = &["image/", "video/", "audio/", "text/html", "application/pdf"];

/// `Content-Disposition` kind for a served file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    /// Full header value, e.g. `attachment; filename="archive.zip"`.
    pub fn header_value(self, filename: &str) -> String {
        format!("{self}; filename=\"{filename}\"")
    }
}

/// MIME type and disposition for a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaClass {
    pub mime: String,
    pub disposition: Disposition,
}

/// Classify a file by extension. Unknown extensions are `application/octet-stream`.
pub fn classify(filename: &str) -> MediaClass {
    let mime = mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let disposition = if INLINE_MIME_PREFIXES.iter().any(|p| mime.starts_with(p)) {
        Disposition::Inline
    } else {
        Disposition::Attachment
    };
    MediaClass { mime, disposition }
}

/// The served URL for a file in the upload root.
pub fn served_url(filename: &str) -> String {
    format!("{UPLOAD_URL_PREFIX}{filename}")
}

fn is_passthrough(reference: &str) -> bool {
    reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with(UPLOAD_URL_PREFIX)
}

/// Response body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUpload {
    pub url: String,
    pub name: String,
}

/// A file read back from the upload root.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub class: MediaClass,
}

#[derive(Debug, Clone)]
pub struct MediaBridge {
    upload_root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaBridge {
    pub fn new(upload_root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            upload_root: upload_root.into(),
            max_upload_bytes,
        }
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Create the upload root if it does not exist.
    pub async fn ensure_root(&self) -> Result<(), WebChatError> {
        tokio::fs::create_dir_all(&self.upload_root).await?;
        Ok(())
    }

    /// Reject sizes above the configured limit.
    pub fn check_size(&self, size: usize) -> Result<(), WebChatError> {
        if size > self.max_upload_bytes {
            return Err(WebChatError::UploadTooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Path of `filename` inside the upload root, or `None` unless the name
    /// is a single plain path component.
    fn path_for(&self, filename: &str) -> Option<PathBuf> {
        is_plain_filename(filename).then(|| self.upload_root.join(filename))
    }

    /// Store an uploaded file, overwriting any existing file of the same name.
    pub async fn store_upload(&self, filename: &str, data: &[u8]) -> Result<StoredUpload, WebChatError> {
        self.check_size(data.len())?;

        let dest = self
            .path_for(filename)
            .ok_or_else(|| WebChatError::Protocol(format!("invalid upload filename: {filename}")))?;
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            info!(path = %dest.display(), "upload filename collision, overwriting");
        }
        tokio::fs::write(&dest, data).await?;
        debug!(name = %filename, size = data.len(), path = %dest.display(), "upload stored");

        Ok(StoredUpload {
            url: served_url(filename),
            name: filename.to_string(),
        })
    }

    /// Read a stored file for download.
    pub async fn open(&self, filename: &str) -> Result<MediaFile, WebChatError> {
        let path = self
            .path_for(filename)
            .ok_or_else(|| WebChatError::MediaNotFound(filename.to_string()))?;
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(WebChatError::MediaNotFound(filename.to_string()));
        }

        let bytes = tokio::fs::read(&path).await?;
        Ok(MediaFile {
            name: filename.to_string(),
            bytes,
            class: classify(filename),
        })
    }

    /// Turn bus media references into URLs the browser can fetch.
    ///
    /// External and served URLs pass through. Local files are copied into the
    /// upload root under their own filename. Empty, missing, or non-file
    /// references are dropped.
    pub async fn resolve_outbound(&self, references: &[String]) -> Vec<String> {
        let mut urls = Vec::with_capacity(references.len());
        for reference in references {
            if reference.is_empty() {
                continue;
            }
            if is_passthrough(reference) {
                urls.push(reference.clone());
                continue;
            }
            match self.bridge_local_file(Path::new(reference)).await {
                Ok(url) => urls.push(url),
                Err(e) => warn!(media = %reference, error = %e, "dropping outbound media"),
            }
        }
        urls
    }

    async fn bridge_local_file(&self, src: &Path) -> Result<String, WebChatError> {
        let is_file = tokio::fs::metadata(src)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        let name = match src.file_name().and_then(|n| n.to_str()) {
            Some(name) if is_file => name.to_string(),
            _ => return Err(WebChatError::MediaNotFound(src.display().to_string())),
        };

        let dest = self
            .path_for(&name)
            .ok_or_else(|| WebChatError::MediaNotFound(src.display().to_string()))?;
        if same_file(src, &dest).await {
            debug!(path = %dest.display(), "outbound media already in upload root");
        } else {
            tokio::fs::copy(src, &dest).await?;
            debug!(src = %src.display(), dest = %dest.display(), "copied outbound media");
        }
        Ok(served_url(&name))
    }

    /// Turn browser media URLs into references the bus can open.
    ///
    /// Served upload URLs become absolute paths under the upload root and
    /// upload URLs that name anything but a plain file are dropped.
    /// Everything else passes through unchanged.
    pub fn resolve_inbound(&self, references: &[String]) -> Vec<String> {
        references
            .iter()
            .filter_map(|reference| match reference.strip_prefix(UPLOAD_URL_PREFIX) {
                Some(name) => match self.path_for(name) {
                    Some(path) => Some(path.display().to_string()),
                    None => {
                        warn!(media = %reference, "dropping inbound media outside upload root");
                        None
                    }
                },
                None => Some(reference.clone()),
            })
            .collect()
    }
}

/// True when `name` is exactly one normal path component: no separators,
/// no `.` or `..`, no root or drive prefix.
fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Whether both paths resolve to the same existing file.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
