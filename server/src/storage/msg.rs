use crate::service::{PBM, PBMResp};
use common::storage::{PhotoRef, PhotoUpload};

#[derive(Debug)]
pub enum StorageMsg {
    StorePhoto {
        resp: PBMResp<PhotoRef>,
        photo: PhotoUpload,
    },
    ListPhotos {
        resp: PBMResp<Vec<String>>,
    },
}

impl From<StorageMsg> for PBM {
    fn from(msg: StorageMsg) -> Self {
        PBM::Storage(msg)
    }
}
