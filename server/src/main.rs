use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tracing::{Level, info};
use tracing_subscriber::{
    filter::FilterFn,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

mod checks;
mod http;
mod service;
mod storage;

use common::{
    config::{BackendKind, PBConfig, read_config},
    storage::{CloudinaryBackend, LocalBackend, StorageBackend},
};
use service::{PBMRegistry, PhotoboothService};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "/etc/photobooth/config.toml")]
    config: String,

    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let max_level = args.log_level;

    // the transport crates are chatty well below the level anyone wants to read
    let crate_filter = FilterFn::new(move |metadata| {
        let target = metadata.target();

        !target.starts_with("h2") && !target.starts_with("hyper") && *metadata.level() <= max_level
    })
    .with_max_level_hint(max_level);

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(crate_filter))
        .init();

    info!("photobooth server starting up, processing config file");

    let config = read_config(PathBuf::from(args.config)).await?;

    info!("performing filesystem sanity checks");

    checks::storage_dirs(&config)?;
    checks::doc_root_exists(&config)?;

    match config.storage_backend {
        BackendKind::Local => run::<LocalBackend>(config).await,
        BackendKind::Cloudinary => run::<CloudinaryBackend>(config).await,
    }
}

async fn run<B: StorageBackend>(config: Arc<PBConfig>) -> Result<()> {
    info!({ backend = ?config.storage_backend }, "starting core services");

    let registry = PBMRegistry::new();

    let storage_svc = storage::svc::StorageService::<B>::create(config.clone(), &registry);
    let http_svc = http::svc::HttpService::create(config.clone(), &registry);

    storage_svc.start(&registry).await?;
    http_svc.start(&registry).await?;

    info!("startup complete!");

    shutdown_signal().await
}

async fn shutdown_signal() -> Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        res = ctrl_c() => {
            res?;
            info!("received Ctrl+C, shutting down");
        },
        _ = terminate.recv() => {
            info!("received terminate signal, shutting down");
        },
    }

    Ok(())
}
