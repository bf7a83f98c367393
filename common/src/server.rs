use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// photobooth server configuration subtables
//
// split out of config.rs to keep parity with the storage backend tables,
// which live next to their implementations
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HttpConfig {
    // ip and port for http server
    pub socket: String,

    // location of the built webapp, served at the root
    pub doc_root: PathBuf,

    // upper bound on request bodies, which in practice means uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}
