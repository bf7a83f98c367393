use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{Level, debug, instrument, warn};

use crate::{
    config::PBConfig,
    storage::{PhotoRef, PhotoUpload, StorageBackend},
};
use api::MAX_GALLERY_RESULTS;

#[derive(Clone, Deserialize, Serialize)]
pub struct CloudinaryConfig {
    // account credentials, usually injected through the environment
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,

    // logical folder all photos are filed under
    #[serde(default = "default_folder")]
    pub folder: String,

    // uploads are spooled here before being sent on
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    // gallery size, never more than MAX_GALLERY_RESULTS
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    // overridable so the backend can be pointed at a mock
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_folder() -> String {
    String::from("photobooth")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("photobooth")
}

fn default_max_results() -> usize {
    MAX_GALLERY_RESULTS
}

fn default_api_url() -> String {
    String::from("https://api.cloudinary.com/v1_1")
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        CloudinaryConfig {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_folder(),
            scratch_dir: default_scratch_dir(),
            max_results: default_max_results(),
            api_url: default_api_url(),
        }
    }
}

// keep the secret out of logs
impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("scratch_dir", &self.scratch_dir)
            .field("max_results", &self.max_results)
            .field("api_url", &self.api_url)
            .finish()
    }
}

// hosted asset store backend
//
// the store keeps the creation time for us, so the gallery is just a search
// query against the folder
#[derive(Debug)]
pub struct CloudinaryBackend {
    config: CloudinaryConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    secure_url: String,
    created_at: DateTime<Utc>,
}

impl CloudinaryBackend {
    pub fn with_config(config: CloudinaryConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build asset store client")?;

        Ok(CloudinaryBackend { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{path}",
            self.config.api_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    fn max_results(&self) -> usize {
        self.config.max_results.min(MAX_GALLERY_RESULTS)
    }
}

// request signature
//
// parameters are sorted by key and joined as a query string, then the secret
// is appended and the whole thing hashed
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));

    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());

    hex::encode(hasher.finalize())
}

#[async_trait]
impl StorageBackend for CloudinaryBackend {
    fn new(config: Arc<PBConfig>) -> Result<Self> {
        let cloudinary = config
            .cloudinary
            .clone()
            .ok_or_else(|| anyhow::Error::msg("cloudinary config not present"))?;

        CloudinaryBackend::with_config(cloudinary)
    }

    #[instrument(level=Level::DEBUG, skip_all, fields(len = photo.bytes.len()))]
    async fn store(&self, photo: PhotoUpload) -> Result<PhotoRef> {
        // the spool file is removed when this handle drops, whichever way we leave
        let spool = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(&self.config.scratch_dir)
            .with_context(|| {
                format!("failed to create spool file in {:?}", self.config.scratch_dir)
            })?;

        tokio::fs::write(spool.path(), &photo.bytes)
            .await
            .context("failed to write spool file")?;

        let data = tokio::fs::read(spool.path())
            .await
            .context("failed to read back spool file")?;

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let mut file = Part::bytes(data)
            .file_name(photo.file_name.unwrap_or_else(|| String::from("photo.jpg")));

        // the asset store sniffs the bytes anyway, so a bogus declared type is dropped
        match photo.content_type {
            Some(content_type) if content_type.parse::<mime_guess::Mime>().is_ok() => {
                file = file
                    .mime_str(&content_type)
                    .context("invalid content type on upload")?;
            }
            Some(content_type) => {
                warn!({ content_type = %content_type }, "ignoring unparseable content type");
            }
            None => (),
        }

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let result: UploadResult = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await
            .context("asset store upload request failed")?
            .error_for_status()
            .context("asset store rejected upload")?
            .json()
            .await
            .context("failed to decode asset store upload response")?;

        debug!({ url = %result.secure_url }, "uploaded photo");

        Ok(PhotoRef::Url(result.secure_url))
    }

    #[instrument(level=Level::DEBUG, skip_all)]
    async fn list(&self) -> Result<Vec<String>> {
        let max_results = self.max_results();

        let query = json!({
            "expression": format!("folder:{}", self.config.folder),
            "sort_by": [{ "created_at": "desc" }],
            "max_results": max_results,
        });

        let result: SearchResult = self
            .client
            .post(self.endpoint("resources/search"))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .json(&query)
            .send()
            .await
            .context("asset store search request failed")?
            .error_for_status()
            .context("asset store rejected search")?
            .json()
            .await
            .context("failed to decode asset store search response")?;

        let mut resources = result.resources;

        // the query already asks for this, but the gallery contract should not
        // depend on the remote end honoring it
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        resources.truncate(max_results);

        Ok(resources.into_iter().map(|r| r.secure_url).collect())
    }
}
