use std::fmt::Debug;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{Level, instrument};

use crate::service::{PBInner, ServiceType};
use crate::storage::msg::StorageMsg;
use common::storage::{PhotoRef, PhotoUpload};

// storage rpc helpers
//
// any service holding a registry can reach the storage service through these,
// without repeating the channel plumbing at each call site
#[async_trait]
pub trait StorageClient: PBInner + Debug {
    #[instrument(level=Level::DEBUG, skip(self, photo))]
    async fn store_photo(&self, photo: PhotoUpload) -> Result<PhotoRef> {
        let storage_svc_sender = self.registry().get(&ServiceType::Storage)?;
        let (tx, rx) = tokio::sync::oneshot::channel();

        storage_svc_sender
            .send(StorageMsg::StorePhoto { resp: tx, photo }.into())
            .await?;

        rx.await?
    }

    #[instrument(level=Level::DEBUG, skip(self))]
    async fn list_photos(&self) -> Result<Vec<String>> {
        let storage_svc_sender = self.registry().get(&ServiceType::Storage)?;
        let (tx, rx) = tokio::sync::oneshot::channel();

        storage_svc_sender
            .send(StorageMsg::ListPhotos { resp: tx }.into())
            .await?;

        rx.await?
    }
}
