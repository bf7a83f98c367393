use anyhow;
use gloo_net::http::Request;
use js_sys::{Array, Uint8Array};
use web_sys::{Blob, BlobPropertyBag, FormData};

use crate::common::{
    dataurl::{binary_string_bytes, split_data_url},
    js_err, window,
};
use api::{PHOTO_FIELD, PHOTOS_PATH, UPLOAD_PATH, photo::*};

// the server ignores the name beyond its extension
const UPLOAD_FILENAME: &str = "photo.jpg";

pub async fn list_photos() -> anyhow::Result<ListPhotosResp> {
    let resp = Request::get(PHOTOS_PATH).send().await?;

    if !resp.ok() {
        let err: ErrorResp = resp.json().await?;
        return Err(anyhow::Error::msg(err.error));
    }

    Ok(resp.json().await?)
}

pub async fn upload_photo(data_url: &str) -> anyhow::Result<UploadPhotoResp> {
    let (mime, payload) = split_data_url(data_url)?;

    let bytes = binary_string_bytes(&window()?.atob(payload).map_err(js_err)?)?;

    let parts = Array::of1(&Uint8Array::from(&bytes[..]));

    let options = BlobPropertyBag::new();
    options.set_type(mime);

    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_err)?;

    let form = FormData::new().map_err(js_err)?;
    form.append_with_blob_and_filename(PHOTO_FIELD, &blob, UPLOAD_FILENAME)
        .map_err(js_err)?;

    let outcome: UploadOutcome = Request::post(UPLOAD_PATH)
        .body(form)?
        .send()
        .await?
        .json()
        .await?;

    match outcome {
        UploadOutcome::Ok(resp) => Ok(resp),
        UploadOutcome::Err(err) => Err(anyhow::Error::msg(err.error)),
    }
}
