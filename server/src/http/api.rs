use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::{
    http::{AppError, svc::HttpEndpoint},
    storage::client::StorageClient,
};
use api::{
    PHOTO_FIELD,
    photo::{ListPhotosResp, UploadPhotoResp},
};
use common::storage::PhotoUpload;

// http api endpoints
//
// these are thin; the storage service does the work and AppError decides what
// the client gets to see when it fails

#[instrument(skip_all)]
pub(super) async fn list_photos(
    State(state): State<Arc<HttpEndpoint>>,
) -> Result<Response, AppError> {
    let images = state.list_photos().await.map_err(AppError::gallery)?;

    debug!({ count = images.len() }, "listed photos");

    Ok(Json(ListPhotosResp { images }).into_response())
}

#[instrument(skip_all)]
pub(super) async fn upload_photo(
    State(state): State<Arc<HttpEndpoint>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    // a body that isn't multipart at all cannot contain the photo either
    let mut multipart = multipart.map_err(|_| AppError::missing_photo())?;

    let photo = read_photo(&mut multipart)
        .await?
        .ok_or_else(AppError::missing_photo)?;

    let reference = state.store_photo(photo).await.map_err(AppError::upload)?;

    Ok(Json(UploadPhotoResp::from(reference)).into_response())
}

// pull the first file part named PHOTO_FIELD out of the form
//
// parts without a filename are plain form values rather than files, and are
// skipped the same as any other field
async fn read_photo(multipart: &mut Multipart) -> Result<Option<PhotoUpload>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(AppError::multipart)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let content_type = field.content_type().map(str::to_owned);

        let bytes = field.bytes().await.map_err(AppError::multipart)?;

        return Ok(Some(PhotoUpload {
            bytes: bytes.to_vec(),
            file_name: Some(file_name),
            content_type,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        http::svc::router,
        service::{PBInner, PBMRegistry, PhotoboothService},
        storage::svc::StorageService,
    };
    use common::{
        config::{BackendKind, PBConfig},
        server::HttpConfig,
        storage::{
            CloudinaryBackend, LocalBackend, StorageBackend, cloudinary::CloudinaryConfig,
            local::LocalConfig,
        },
    };

    // SOI, a comment segment, EOI: enough of a jpeg for a server that never decodes it
    const TINY_JPEG: &[u8] = b"\xff\xd8\xff\xfe\x00\x06booth\xff\xd9";

    const BOUNDARY: &str = "photoboothtestboundary";

    struct TestServer {
        dir: TempDir,
        router: Router,
    }

    impl TestServer {
        fn uploads(&self) -> std::path::PathBuf {
            self.dir.path().join("uploads")
        }
    }

    fn config(
        root: &Path,
        storage_backend: BackendKind,
        max_upload_bytes: usize,
    ) -> Arc<PBConfig> {
        Arc::new(PBConfig {
            storage_backend,
            http: HttpConfig {
                socket: String::from("127.0.0.1:0"),
                doc_root: root.join("public"),
                max_upload_bytes,
            },
            local: Some(LocalConfig {
                upload_dir: root.join("uploads"),
            }),
            cloudinary: Some(CloudinaryConfig {
                cloud_name: String::from("demo"),
                api_key: String::from("1234"),
                api_secret: String::from("hush"),
                scratch_dir: root.join("scratch"),
                api_url: String::from("http://127.0.0.1:9"),
                ..CloudinaryConfig::default()
            }),
        })
    }

    async fn start<B: StorageBackend>(
        storage_backend: BackendKind,
        max_upload_bytes: usize,
    ) -> TestServer {
        let dir = TempDir::new().unwrap();

        for sub in ["uploads", "public", "scratch"] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
        }
        std::fs::write(
            dir.path().join("public").join("index.html"),
            "<!doctype html><title>photobooth</title>",
        )
        .unwrap();

        let config = config(dir.path(), storage_backend, max_upload_bytes);
        let registry = PBMRegistry::new();

        let storage_svc = StorageService::<B>::create(config.clone(), &registry);
        storage_svc.start(&registry).await.unwrap();

        let state = Arc::new(HttpEndpoint::new(config, registry).unwrap());

        TestServer {
            dir,
            router: router(state),
        }
    }

    async fn start_local() -> TestServer {
        start::<LocalBackend>(BackendKind::Local, 1024 * 1024).await
    }

    fn form(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();

        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());

            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: image/jpeg\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }

            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, body.to_vec())
    }

    async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(router, request).await;

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn uploaded_photo_round_trips_through_gallery() {
        let server = start_local().await;

        let (status, body) =
            send_json(&server.router, form(&[("photo", Some("photo.jpg"), TINY_JPEG)])).await;

        assert_eq!(status, StatusCode::OK);
        let filename = body["filename"].as_str().unwrap().to_owned();
        assert!(filename.ends_with(".jpg"));

        let (status, body) = send_json(&server.router, get("/api/photos")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["images"], serde_json::json!([filename]));

        let (status, bytes) = send(&server.router, get(&format!("/uploads/{filename}"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, TINY_JPEG);
    }

    #[tokio::test]
    async fn jpeg_sent_with_foreign_extension_still_reaches_gallery() {
        let server = start_local().await;

        let (status, body) =
            send_json(&server.router, form(&[("photo", Some("snap.gif"), TINY_JPEG)])).await;

        assert_eq!(status, StatusCode::OK);
        let filename = body["filename"].as_str().unwrap().to_owned();
        assert!(filename.ends_with(".jpg"));

        let (_, body) = send_json(&server.router, get("/api/photos")).await;

        assert_eq!(body["images"], serde_json::json!([filename]));
    }

    #[tokio::test]
    async fn gallery_lists_newest_upload_first() {
        let server = start_local().await;

        let mut filenames = Vec::new();
        for _ in 0..3 {
            let (_, body) =
                send_json(&server.router, form(&[("photo", Some("photo.jpg"), TINY_JPEG)])).await;
            filenames.push(body["filename"].as_str().unwrap().to_owned());

            // keep the millisecond prefixes apart
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let (_, body) = send_json(&server.router, get("/api/photos")).await;

        filenames.reverse();
        assert_eq!(body["images"], serde_json::json!(filenames));
    }

    #[tokio::test]
    async fn upload_without_photo_is_rejected() {
        let server = start_local().await;

        let (status, body) =
            send_json(&server.router, form(&[("caption", None, &b"cheese"[..])])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "No photo received" }));

        let (_, body) = send_json(&server.router, get("/api/photos")).await;
        assert_eq!(body["images"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn photo_field_must_be_a_file() {
        let server = start_local().await;

        let (status, body) = send_json(&server.router, form(&[("photo", None, TINY_JPEG)])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No photo received");
    }

    #[tokio::test]
    async fn photo_is_found_among_other_fields() {
        let server = start_local().await;

        let (status, body) = send_json(
            &server.router,
            form(&[
                ("caption", None, &b"cheese"[..]),
                ("photo", Some("snap.PNG"), TINY_JPEG),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["filename"].as_str().unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn non_multipart_upload_is_rejected() {
        let server = start_local().await;

        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, body) = send_json(&server.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No photo received");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let server = start::<LocalBackend>(BackendKind::Local, 64).await;

        let (status, body) =
            send_json(&server.router, form(&[("photo", Some("photo.jpg"), &[0u8; 4096][..])])).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Photo too large");
    }

    #[tokio::test]
    async fn gallery_failure_hides_details() {
        let server = start_local().await;

        std::fs::remove_dir(server.uploads()).unwrap();

        let (status, body) = send_json(&server.router, get("/api/photos")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Gallery load failed" }));
    }

    #[tokio::test]
    async fn upload_failure_hides_details() {
        let server = start_local().await;

        std::fs::remove_dir(server.uploads()).unwrap();

        let (status, body) =
            send_json(&server.router, form(&[("photo", Some("photo.jpg"), TINY_JPEG)])).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Upload failed" }));
    }

    #[tokio::test]
    async fn entry_page_is_served_at_root() {
        let server = start_local().await;

        let (status, body) = send(&server.router, get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("<title>photobooth</title>"));
    }

    #[tokio::test]
    async fn missing_upload_is_not_found() {
        let server = start_local().await;

        let (status, _) = send(&server.router, get("/uploads/nope.jpg")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn asset_store_deployment_does_not_serve_uploads() {
        let server = start::<CloudinaryBackend>(BackendKind::Cloudinary, 1024 * 1024).await;

        std::fs::write(server.uploads().join("1-a.jpg"), TINY_JPEG).unwrap();

        let (status, _) = send(&server.router, get("/uploads/1-a.jpg")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn asset_store_outage_is_a_generic_error() {
        // nothing listens on the discard port, so every call fails
        let server = start::<CloudinaryBackend>(BackendKind::Cloudinary, 1024 * 1024).await;

        let (status, body) = send_json(&server.router, get("/api/photos")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Gallery load failed");

        let (status, body) =
            send_json(&server.router, form(&[("photo", Some("photo.jpg"), TINY_JPEG)])).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");

        let scratch = server.dir.path().join("scratch");
        assert!(std::fs::read_dir(scratch).unwrap().next().is_none());
    }
}
