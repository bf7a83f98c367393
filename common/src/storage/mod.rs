use std::{fmt, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;

use crate::config::PBConfig;
use api::photo::UploadPhotoResp;

pub mod cloudinary;
pub mod local;
pub mod naming;

pub use cloudinary::CloudinaryBackend;
pub use local::LocalBackend;

// a photo as it arrives from the upload form
#[derive(Clone)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,

    // whatever the browser claimed, which we only use to pick an extension
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

// the payload is summarized so that message logging stays readable
impl fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("len", &self.bytes.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}

// how a client finds a stored photo again
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PhotoRef {
    Filename(String),
    Url(String),
}

impl From<PhotoRef> for UploadPhotoResp {
    fn from(reference: PhotoRef) -> Self {
        match reference {
            PhotoRef::Filename(filename) => UploadPhotoResp::Stored { filename },
            PhotoRef::Url(url) => UploadPhotoResp::Hosted { url },
        }
    }
}

// these are the storage calls that any backend must be able to process
//
// the server picks exactly one implementation at startup based on the
// storage_backend config key
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    fn new(config: Arc<PBConfig>) -> Result<Self>
    where
        Self: Sized;

    // persist the photo and hand back its reference
    async fn store(&self, photo: PhotoUpload) -> Result<PhotoRef>;

    // gallery references, newest first
    async fn list(&self) -> Result<Vec<String>>;
}
