use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{Level, debug, instrument, warn};

use crate::{
    config::PBConfig,
    storage::{
        PhotoRef, PhotoUpload, StorageBackend,
        naming::{generate_filename, is_gallery_image, photo_extension, sort_newest_first},
    },
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LocalConfig {
    // read-write directory holding the uploaded photos, which is also
    // served verbatim under /uploads
    pub upload_dir: PathBuf,
}

// local disk backend
//
// photos are plain files in a single directory and the directory listing is
// the gallery, so there is no index to keep in sync
#[derive(Debug)]
pub struct LocalBackend {
    upload_dir: PathBuf,
}

// a fresh uuid colliding is not a realistic event, but create_new means we
// would notice rather than clobber someone's photo
const NAME_ATTEMPTS: usize = 3;

impl LocalBackend {
    pub fn with_dir(upload_dir: PathBuf) -> Self {
        LocalBackend { upload_dir }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn new(config: Arc<PBConfig>) -> Result<Self> {
        let local = config
            .local
            .as_ref()
            .ok_or_else(|| anyhow::Error::msg("[config.local] not present"))?;

        Ok(LocalBackend::with_dir(local.upload_dir.clone()))
    }

    #[instrument(level=Level::DEBUG, skip_all, fields(len = photo.bytes.len()))]
    async fn store(&self, photo: PhotoUpload) -> Result<PhotoRef> {
        let extension = photo_extension(photo.file_name.as_deref(), photo.content_type.as_deref());

        let mut attempt = 0;

        let (filename, path, mut file) = loop {
            let filename = generate_filename(Utc::now().timestamp_millis(), extension.as_deref());
            let path = self.upload_dir.join(&filename);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (filename, path, file),
                Err(err)
                    if err.kind() == ErrorKind::AlreadyExists && attempt + 1 < NAME_ATTEMPTS =>
                {
                    warn!({ filename = %filename }, "generated filename already exists");
                    attempt += 1;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to create {path:?}"));
                }
            }
        };

        let written = async {
            file.write_all(&photo.bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(err) = written {
            // a half-written jpeg would otherwise show up as a broken gallery tile
            if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                warn!({ path = ?path, error = %rm_err }, "failed to remove partial upload");
            }

            return Err(err).with_context(|| format!("failed to write {path:?}"));
        }

        debug!({ filename = %filename }, "stored photo");

        Ok(PhotoRef::Filename(filename))
    }

    #[instrument(level=Level::DEBUG, skip_all)]
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.upload_dir)
            .await
            .with_context(|| format!("failed to read {:?}", self.upload_dir))?;

        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            // names we generate are always utf-8; anything else was not put there by us
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };

            if is_gallery_image(&name) {
                names.push(name);
            }
        }

        sort_newest_first(&mut names);

        Ok(names)
    }
}
