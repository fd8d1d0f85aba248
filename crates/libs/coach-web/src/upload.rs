//! Storage for evidence images uploaded by coaches.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::prelude::*;

/// Directory, below the media root, holding uploaded evidence.
pub const EVIDENCE_DIR: &str = "evidence";
const FALLBACK_NAME: &str = "upload";

/// Where uploads are written and the URL prefix they are served under.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Server-relative URL, e.g. `/media/evidence/…png`.
    pub url: String,
    pub absolute_url: String,
    /// Path relative to the media root.
    pub path: String,
}

/// Keeps the last path component and only `[A-Za-z0-9_.-]`; spaces become underscores.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => String::from(FALLBACK_NAME),
        _ => cleaned,
    }
}

impl MediaStore {
    /// `url` is normalised to start and end with `/`.
    pub fn new(root: impl Into<PathBuf>, url: &str) -> Self {
        let trimmed = url.trim_matches('/');
        let url = if trimmed.is_empty() {
            String::from("/")
        } else {
            format!("/{trimmed}/")
        };
        Self {
            root: root.into(),
            url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stores an image under a unique name and returns its location.
    ///
    /// Anything whose content type is not `image/*` is refused.
    pub async fn save_image(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
        origin: &str,
    ) -> Result<UploadResponse> {
        if !content_type.is_some_and(|kind| kind.starts_with("image/")) {
            return Err(Error::BadRequest(String::from("only image files allowed")));
        }

        let dir = self.root.join(EVIDENCE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(file_name.unwrap_or(FALLBACK_NAME))
        );
        tokio::fs::write(dir.join(&name), bytes).await?;

        let path = format!("{EVIDENCE_DIR}/{name}");
        let url = format!("{}{path}", self.url);
        info!("Stored evidence upload {path} ({} bytes)", bytes.len());
        Ok(UploadResponse {
            absolute_url: format!("{}{url}", origin.trim_end_matches('/')),
            url,
            path,
        })
    }
}
