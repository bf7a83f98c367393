use std::marker::PhantomData;
use std::sync::Arc;

use async_cell::sync::AsyncCell;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::service::{PBInner, PBM, PBMReceiver, PBMRegistry, PhotoboothService, ServiceType};
use crate::storage::msg::StorageMsg;
use common::config::PBConfig;
use common::storage::StorageBackend;

// storage service
//
// owns the one configured backend; every request is answered on its own task,
// so a slow upload to the asset store never holds up a gallery listing
pub struct StorageService<B: StorageBackend> {
    config: Arc<PBConfig>,
    receiver: Arc<Mutex<PBMReceiver>>,
    handle: AsyncCell<tokio::task::JoinHandle<anyhow::Result<()>>>,
    backend: PhantomData<B>,
}

#[async_trait]
impl<B: StorageBackend> PhotoboothService for StorageService<B> {
    type Inner = StorageRunner<B>;

    fn create(config: Arc<PBConfig>, registry: &PBMRegistry) -> Self {
        let (tx, rx) = tokio::sync::mpsc::channel::<PBM>(1024);

        registry
            .insert(ServiceType::Storage, tx)
            .expect("failed to add storage sender to registry");

        StorageService {
            config: config.clone(),
            receiver: Arc::new(Mutex::new(rx)),
            handle: AsyncCell::new(),
            backend: PhantomData::<B>,
        }
    }

    #[instrument(skip(self, registry))]
    async fn start(&self, registry: &PBMRegistry) -> anyhow::Result<()> {
        info!("starting storage service");

        let receiver = Arc::clone(&self.receiver);
        let state = Arc::new(StorageRunner::<B>::new(self.config.clone(), registry.clone())?);

        let serve = {
            async move {
                let mut receiver = receiver.lock().await;

                while let Some(msg) = receiver.recv().await {
                    let state = Arc::clone(&state);
                    tokio::task::spawn(async move {
                        match state.message_handler(msg).await {
                            Ok(()) => (),
                            Err(err) => error!(
                                { service = "storage", channel = "pbm", error = %err },
                                "failed to answer message"
                            ),
                        }
                    });
                }

                Err::<(), anyhow::Error>(anyhow::Error::msg("channel disconnected"))
            }
        };

        let handle = tokio::task::spawn(serve);

        self.handle.set(handle);

        debug!("started storage service");

        Ok(())
    }
}

pub struct StorageRunner<B: StorageBackend> {
    registry: PBMRegistry,
    backend: B,
}

#[async_trait]
impl<B: StorageBackend> PBInner for StorageRunner<B> {
    fn new(config: Arc<PBConfig>, registry: PBMRegistry) -> anyhow::Result<Self> {
        Ok(StorageRunner {
            registry: registry.clone(),
            backend: B::new(config.clone())?,
        })
    }

    fn registry(&self) -> PBMRegistry {
        self.registry.clone()
    }

    async fn message_handler(&self, pbm: PBM) -> anyhow::Result<()> {
        match pbm {
            PBM::Storage(message) => match message {
                StorageMsg::StorePhoto { resp, photo } => {
                    self.respond(resp, self.backend.store(photo)).await
                }
                StorageMsg::ListPhotos { resp } => self.respond(resp, self.backend.list()).await,
            },
        }
    }
}
