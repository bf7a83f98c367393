use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio;
use toml;
use tracing::{Level, debug, instrument};

use crate::{
    server::HttpConfig,
    storage::{cloudinary::CloudinaryConfig, local::LocalConfig},
};

// photobooth configuration
//
// this struct is read once at startup and handed to each service by Arc, so
// nothing about the storage location or credentials lives in a global
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PBConfig {
    pub storage_backend: BackendKind,

    // core services
    pub http: HttpConfig,

    // backends
    pub local: Option<LocalConfig>,
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum BackendKind {
    // files in a directory on this machine
    Local,
    // the hosted cloudinary asset store
    Cloudinary,
}

// in order to extract the config table from a larger document, we need to specify it
// as a subtable of the root node, i.e. a substruct
#[derive(Debug, Deserialize, Serialize)]
struct TomlConfigFile {
    config: PBConfig,
}

// environment variables consulted after the file is parsed
pub const PORT_VAR: &str = "PORT";
pub const CLOUDINARY_NAME_VAR: &str = "CLOUDINARY_NAME";
pub const CLOUDINARY_KEY_VAR: &str = "CLOUDINARY_KEY";
pub const CLOUDINARY_SECRET_VAR: &str = "CLOUDINARY_SECRET";

#[instrument(level=Level::DEBUG)]
pub async fn read_config(filename: PathBuf) -> Result<Arc<PBConfig>> {
    debug!("reading config file");

    let doc = tokio::fs::read_to_string(&filename)
        .await
        .with_context(|| format!("failed to read config file {filename:?}"))?;

    let mut config = parse_config(&doc)?;

    apply_env(&mut config, |key| std::env::var(key).ok())?;

    config.validate()?;

    debug!("successfully parsed config file");
    Ok(Arc::new(config))
}

pub fn parse_config(doc: &str) -> Result<PBConfig> {
    // the toml error would echo the offending line, which may well be the api secret
    let data: TomlConfigFile = toml::from_str(doc).map_err(|err| {
        anyhow::Error::msg(format!("failed to parse config file: {}", err.message()))
    })?;

    Ok(data.config)
}

// overlay the deployment environment onto the parsed file
//
// the lookup is passed in so that tests don't have to touch the process environment
pub fn apply_env<F>(config: &mut PBConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(PORT_VAR) {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("{PORT_VAR} is not a valid port: {port}"))?;

        let mut socket: SocketAddr = config.http.socket.parse().with_context(|| {
            format!("http.socket is not a socket address: {}", config.http.socket)
        })?;

        socket.set_port(port);
        config.http.socket = socket.to_string();
    }

    let name = lookup(CLOUDINARY_NAME_VAR);
    let key = lookup(CLOUDINARY_KEY_VAR);
    let secret = lookup(CLOUDINARY_SECRET_VAR);

    if name.is_some() || key.is_some() || secret.is_some() {
        let cloudinary = config.cloudinary.get_or_insert_with(CloudinaryConfig::default);

        if let Some(name) = name {
            cloudinary.cloud_name = name;
        }
        if let Some(key) = key {
            cloudinary.api_key = key;
        }
        if let Some(secret) = secret {
            cloudinary.api_secret = secret;
        }
    }

    Ok(())
}

impl PBConfig {
    // make sure the selected backend actually has what it needs
    pub fn validate(&self) -> Result<()> {
        self.http.socket.parse::<SocketAddr>().with_context(|| {
            format!("http.socket is not a socket address: {}", self.http.socket)
        })?;

        match self.storage_backend {
            BackendKind::Local => {
                self.local.as_ref().ok_or_else(|| {
                    anyhow::Error::msg("storage_backend is Local but [config.local] is missing")
                })?;
            }
            BackendKind::Cloudinary => {
                let cloudinary = self.cloudinary.as_ref().ok_or_else(|| {
                    anyhow::Error::msg(
                        "storage_backend is Cloudinary but no cloudinary credentials were given",
                    )
                })?;

                for (field, value) in [
                    ("cloud_name", &cloudinary.cloud_name),
                    ("api_key", &cloudinary.api_key),
                    ("api_secret", &cloudinary.api_secret),
                ] {
                    if value.is_empty() {
                        return Err(anyhow::Error::msg(format!("cloudinary.{field} is empty")));
                    }
                }
            }
        }

        Ok(())
    }
}
