use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_cell::sync::AsyncCell;
use async_trait::async_trait;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::Service;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, instrument, warn};

use crate::http::api::{list_photos, upload_photo};
use crate::service::{PBInner, PBM, PBMRegistry, PhotoboothService};
use crate::storage::client::StorageClient;
use api::{PHOTOS_PATH, UPLOAD_PATH, UPLOADS_PATH};
use common::config::{BackendKind, PBConfig};

// http service
//
// unlike the storage service, nothing sends messages to http; it exists to own
// the listener task and translate requests into storage rpcs
pub struct HttpService {
    config: Arc<PBConfig>,
    hyper_handle: AsyncCell<tokio::task::JoinHandle<Result<()>>>,
}

#[async_trait]
impl PhotoboothService for HttpService {
    type Inner = HttpEndpoint;

    fn create(config: Arc<PBConfig>, _registry: &PBMRegistry) -> Self {
        HttpService {
            config: config.clone(),
            hyper_handle: AsyncCell::new(),
        }
    }

    #[instrument(skip(self, registry))]
    async fn start(&self, registry: &PBMRegistry) -> Result<()> {
        info!("starting http service");

        let state = Arc::new(HttpEndpoint::new(self.config.clone(), registry.clone())?);

        let socket: SocketAddr = self
            .config
            .http
            .socket
            .parse()
            .context("failed to parse http.socket")?;

        // bind here rather than in the task so that a busy port fails startup
        let listener = TcpListener::bind(socket)
            .await
            .with_context(|| format!("failed to bind {socket}"))?;

        info!({ socket = %socket }, "http service listening");

        let hyper_handle = tokio::task::spawn(serve_http(listener, router(state)));

        self.hyper_handle.set(hyper_handle);

        debug!("started http service");

        Ok(())
    }
}

#[derive(Debug)]
pub struct HttpEndpoint {
    registry: PBMRegistry,
    pub(super) doc_root: PathBuf,
    pub(super) uploads_dir: Option<PathBuf>,
    pub(super) max_upload_bytes: usize,
}

#[async_trait]
impl PBInner for HttpEndpoint {
    fn new(config: Arc<PBConfig>, registry: PBMRegistry) -> Result<Self> {
        // only local storage has anything for us to serve; asset store urls
        // point straight at the store
        let uploads_dir = match config.storage_backend {
            BackendKind::Local => Some(
                config
                    .local
                    .as_ref()
                    .ok_or_else(|| anyhow::Error::msg("[config.local] not present"))?
                    .upload_dir
                    .clone(),
            ),
            BackendKind::Cloudinary => None,
        };

        Ok(HttpEndpoint {
            registry,
            doc_root: config.http.doc_root.clone(),
            uploads_dir,
            max_upload_bytes: config.http.max_upload_bytes,
        })
    }

    fn registry(&self) -> PBMRegistry {
        self.registry.clone()
    }

    async fn message_handler(&self, _pbm: PBM) -> Result<()> {
        Err(anyhow::Error::msg("not implemented"))
    }
}

impl StorageClient for HttpEndpoint {}

pub(crate) fn router(state: Arc<HttpEndpoint>) -> Router {
    let mut router = Router::new()
        .route(PHOTOS_PATH, get(list_photos))
        .route(UPLOAD_PATH, post(upload_photo));

    if let Some(uploads_dir) = &state.uploads_dir {
        router = router.nest_service(UPLOADS_PATH, ServeDir::new(uploads_dir));
    }

    // everything else is the webapp, with index.html at the root
    router
        .fallback_service(ServeDir::new(&state.doc_root))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

async fn serve_http(listener: TcpListener, router: Router) -> Result<()> {
    let service = hyper::service::service_fn(move |request: Request<hyper::body::Incoming>| {
        router.clone().call(request)
    });

    // the main http server loop
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                // errors like EMFILE persist until some connection closes, so
                // retrying straight away would just spin
                warn!({ error = %err }, "failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let service = service.clone();

        let io = hyper_util::rt::TokioIo::new(stream);

        tokio::task::spawn(async move {
            if let Err(err) =
                hyper_util::server::conn::auto::Builder::new(hyper_util::rt::TokioExecutor::new())
                    .serve_connection(io, service)
                    .await
            {
                debug!({ peer = %peer, error = %err }, "connection closed with error");
            }
        });
    }
}
