//! Media Uploads
//!
//! Stores inspection photos and deposit slips in object storage and
//! reports the URL they can be fetched from.

mod storage;
mod upload;

pub use storage::{MemoryObjectStorage, ObjectStorage, StoredObject};
pub use upload::{
    display_url, full_image_url, ImageFile, ImageUploadResult, ImageUploader, UploadStatus,
    DEFAULT_FOLDER,
};

use thiserror::Error;

/// Media errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Object not found: {0}")]
    NotFound(String),
}
