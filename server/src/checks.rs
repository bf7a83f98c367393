use std::{
    fs::{canonicalize, create_dir_all, exists, read, remove_file, write},
    path::Path,
};

use anyhow::{self, Context};
use rand::random;
use tracing::debug;

use common::config::{BackendKind, PBConfig};

// startup sanity checks
//
// everything here runs before the services start, so a misconfigured directory
// stops the server instead of turning every upload into a 500

pub fn create_temp_file(dir: &Path) -> anyhow::Result<()> {
    // needed to be completely unambiguous which directory we are checking
    let dir = canonicalize(dir).with_context(|| format!("failed to canonicalize {dir:?}"))?;

    // this ensures that we create a new file
    let mut filename = dir.join(format!(".photobooth-check-{}", random::<u64>()));
    let mut count = 0;

    while exists(&filename)? {
        filename = dir.join(format!(".photobooth-check-{}", random::<u64>()));

        if count < 10 {
            count += 1;
        } else {
            return Err(anyhow::Error::msg(format!(
                "create_temp_file failed to find unique filename ten times for directory {dir:?}"
            )));
        }
    }

    // mock data to make sure that we can read any file we create
    let data = random::<i64>().to_ne_bytes();

    write(&filename, data).with_context(|| format!("{dir:?} is not writeable"))?;

    if read(&filename)? != data {
        return Err(anyhow::Error::msg(format!(
            "data readback failed on {filename:?}"
        )));
    }

    remove_file(&filename)?;

    Ok(())
}

pub fn writeable_dir(dir: &Path) -> anyhow::Result<()> {
    if !exists(dir)? {
        debug!({ dir = ?dir }, "creating directory");
        create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
    }

    create_temp_file(dir)
}

// the directory the configured backend writes into
pub fn storage_dirs(config: &PBConfig) -> anyhow::Result<()> {
    match config.storage_backend {
        BackendKind::Local => {
            let local = config
                .local
                .as_ref()
                .ok_or_else(|| anyhow::Error::msg("[config.local] not present"))?;

            writeable_dir(&local.upload_dir)
        }
        BackendKind::Cloudinary => {
            let cloudinary = config
                .cloudinary
                .as_ref()
                .ok_or_else(|| anyhow::Error::msg("cloudinary config not present"))?;

            writeable_dir(&cloudinary.scratch_dir)
        }
    }
}

pub fn doc_root_exists(config: &PBConfig) -> anyhow::Result<()> {
    let doc_root = &config.http.doc_root;

    if !doc_root.is_dir() {
        return Err(anyhow::Error::msg(format!(
            "http.doc_root {doc_root:?} is not a directory"
        )));
    }

    Ok(())
}
