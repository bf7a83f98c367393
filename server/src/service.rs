use std::{future::Future, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio;

use common::config::PBConfig;

// services that accept messages; http only ever sends them
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ServiceType {
    Storage,
}

// Photobooth Messages
//
// without higher-kinded types, we use the normal enum-of-enums
// to enable general safe message passing between services
pub type PBMSender = tokio::sync::mpsc::Sender<PBM>;
pub type PBMReceiver = tokio::sync::mpsc::Receiver<PBM>;

// message responses are carried back via oneshot channels.  this
// type eliminates quite a bit of boilerplate in the responder logic.
pub type PBMResp<T> = tokio::sync::oneshot::Sender<Result<T>>;

#[derive(Debug)]
pub enum PBM {
    Storage(crate::storage::msg::StorageMsg),
}

// service registry
//
// each service is instantiated once and there is one message namespace, which keeps
// the generic service traits simple via registry()
#[derive(Clone, Debug)]
pub struct PBMRegistry(Arc<DashMap<ServiceType, PBMSender>>);

impl PBMRegistry {
    pub fn new() -> Self {
        PBMRegistry(Arc::new(DashMap::new()))
    }

    pub fn insert(&self, k: ServiceType, v: PBMSender) -> Result<()> {
        match self.0.insert(k.clone(), v) {
            None => Ok(()),
            Some(w) => {
                self.0.insert(k, w);
                Err(anyhow::Error::msg(
                    "internal error: a sender was added twice to the registry",
                ))
            }
        }
    }

    pub fn get(&self, k: &ServiceType) -> Result<PBMSender> {
        Ok(self
            .0
            .get(k)
            .ok_or_else(|| {
                anyhow::Error::msg(format!(
                    "internal error: a service was started without a necessary dependency ({:?})",
                    k
                ))
            })?
            .clone())
    }
}

// core service trait
#[async_trait]
pub trait PhotoboothService: Send + Sync + 'static {
    type Inner: PBInner;

    fn create(config: Arc<PBConfig>, registry: &PBMRegistry) -> Self;

    async fn start(&self, registry: &PBMRegistry) -> Result<()>;
}

// service message responder
//
// in the spirit of tower, services answer rpc-style messages in message_handler.  services
// may respond to external requests on other channels (http) as well.
#[async_trait]
pub trait PBInner: Sized + Send + Sync + 'static {
    fn new(config: Arc<PBConfig>, registry: PBMRegistry) -> Result<Self>;

    fn registry(&self) -> PBMRegistry;

    async fn message_handler(&self, pbm: PBM) -> Result<()>;

    // rather than have the inner service functions (i.e., the rpc calls) respond directly,
    // we define this helper function for use in the message_handler loop
    async fn respond<T, Fut>(&self, resp: PBMResp<T>, fut: Fut) -> Result<()>
    where
        T: Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
    {
        resp.send(fut.await).map_err(|_| {
            anyhow::Error::msg(format!(
                "failed to respond to a {} message",
                std::any::type_name::<T>()
            ))
        })
    }
}
