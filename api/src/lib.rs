pub mod photo;

// url layout
//
// these are shared between the http service router and the webapp so that
// the two sides cannot drift apart
pub const UPLOAD_PATH: &str = "/upload";
pub const PHOTOS_PATH: &str = "/api/photos";
pub const UPLOADS_PATH: &str = "/uploads";

// multipart field name carrying the jpeg bytes
pub const PHOTO_FIELD: &str = "photo";

// the remote asset store never returns more than this many gallery entries
pub const MAX_GALLERY_RESULTS: usize = 30;

// builds the src attribute for a gallery reference
//
// local references are bare filenames served out of UPLOADS_PATH, while the
// asset store hands back absolute urls that are used verbatim
pub fn photo_src(reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_owned()
    } else {
        format!("{UPLOADS_PATH}/{reference}")
    }
}
