//! Image uploads

use crate::storage::ObjectStorage;
use crate::MediaError;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use uuid::Uuid;

/// Folder used when the caller does not name one
pub const DEFAULT_FOLDER: &str = "uploads";

/// Content type for bytes that are not a recognised image
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// MIME type sniffed from the file contents
    pub fn content_type(&self) -> &'static str {
        image::guess_format(&self.bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

/// Upload lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Uploaded,
    Verified,
    Unverified,
    Error,
}

/// Outcome of one upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResult {
    pub success: bool,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ImageUploadResult {
    fn failed(error: &MediaError) -> Self {
        Self {
            success: false,
            status: UploadStatus::Error,
            preview_url: None,
            server_url: None,
            error: Some(error.to_string()),
            upload_id: None,
            file_name: None,
        }
    }
}

/// Uploads images and reports where they landed
#[derive(Clone)]
pub struct ImageUploader {
    storage: Arc<dyn ObjectStorage>,
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Upload one file into `folder`; failures are reported in the result
    pub async fn upload(&self, file: ImageFile, folder: &str) -> ImageUploadResult {
        let upload_id = generate_upload_id();
        let file_name = format!("{}_{}", upload_id, file.name);
        let path = format!("{}/{}", folder.trim_matches('/'), file_name);
        let content_type = file.content_type();

        match self.storage.put(&path, file.bytes, content_type).await {
            Ok(url) => {
                info!("Uploaded {} ({})", path, content_type);
                ImageUploadResult {
                    success: true,
                    // The URL came back from storage itself
                    status: UploadStatus::Verified,
                    preview_url: None,
                    server_url: Some(url),
                    error: None,
                    upload_id: Some(upload_id),
                    file_name: Some(file_name),
                }
            }
            Err(e) => {
                error!("Upload of {} failed: {}", path, e);
                ImageUploadResult::failed(&e)
            }
        }
    }

    /// Upload several files at once and return the URLs of those that
    /// succeeded, in input order
    pub async fn upload_all(&self, files: Vec<ImageFile>, folder: &str) -> Vec<String> {
        let uploads = files.into_iter().map(|file| self.upload(file, folder));
        join_all(uploads)
            .await
            .iter()
            .filter(|result| result.success)
            .map(|result| display_url(result).to_string())
            .collect()
    }

    /// Delete a previously uploaded image by URL
    pub async fn delete(&self, url: &str) -> Result<(), MediaError> {
        self.storage.delete(url).await
    }
}

/// `upload_{epoch millis}_{9 random characters}`
fn generate_upload_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let random = Uuid::new_v4().simple().to_string();
    format!("upload_{}_{}", millis, &random[..9])
}

/// URL to show for an upload: server URL, else preview URL, else empty
pub fn display_url(result: &ImageUploadResult) -> &str {
    result
        .server_url
        .as_deref()
        .or(result.preview_url.as_deref())
        .unwrap_or_default()
}

/// Resolve a stored image reference to a full URL
pub fn full_image_url(url: Option<&str>) -> String {
    url.unwrap_or_default().to_string()
}
