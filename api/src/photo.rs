use serde::{Deserialize, Serialize};

// gallery listing
//
// images are either bare filenames (local storage) or absolute urls (asset
// store), always ordered newest first
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPhotosResp {
    pub images: Vec<String>,
}

// upload result
//
// the two storage backends answer with different keys, and the webapp treats
// the presence of either as success
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadPhotoResp {
    Stored { filename: String },
    Hosted { url: String },
}

impl UploadPhotoResp {
    pub fn reference(&self) -> &str {
        match self {
            UploadPhotoResp::Stored { filename } => filename,
            UploadPhotoResp::Hosted { url } => url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResp {
    pub error: String,
}

// the body the webapp sees from /upload, which may be either shape
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    Ok(UploadPhotoResp),
    Err(ErrorResp),
}
