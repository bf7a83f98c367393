use std::cmp::Ordering;

use uuid::Uuid;

// filename policy for locally stored photos
//
// names look like <millis>-<uuid>.<ext>, where the leading timestamp gives the
// gallery its order and the uuid makes collisions a non-issue

// extensions the gallery is willing to show
pub const GALLERY_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const MAX_EXTENSION_LEN: usize = 8;

pub fn generate_filename(millis: i64, extension: Option<&str>) -> String {
    let id = Uuid::new_v4().simple();

    match extension {
        Some(ext) => format!("{millis}-{id}.{ext}"),
        None => format!("{millis}-{id}"),
    }
}

// pick the extension for a new file
//
// anything the gallery lists wins, from the original name first and then from
// the declared content type; only when neither is listable does the original
// name's extension (or the content type's first guess) get used as-is
pub fn photo_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
    let original = file_name.and_then(extension_of).and_then(sanitize_extension);

    if let Some(ext) = original.as_deref().filter(|ext| is_gallery_extension(ext)) {
        return Some(ext.to_owned());
    }

    let candidates = content_type.and_then(mime_guess::get_mime_extensions_str);

    if let Some(ext) = candidates.and_then(|candidates| {
        GALLERY_EXTENSIONS
            .iter()
            .find(|ext| candidates.contains(ext))
    }) {
        return Some((*ext).to_owned());
    }

    original.or_else(|| {
        candidates
            .and_then(|candidates| candidates.first())
            .and_then(|ext| sanitize_extension(ext))
    })
}

fn is_gallery_extension(ext: &str) -> bool {
    GALLERY_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
}

pub fn is_gallery_image(name: &str) -> bool {
    extension_of(name).is_some_and(is_gallery_extension)
}

// the millisecond prefix, if the name has one
pub fn timestamp_of(name: &str) -> Option<i64> {
    let (prefix, _) = name.split_once('-')?;

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    prefix.parse().ok()
}

// newest first by timestamp; names without one go last, alphabetically
pub fn sort_newest_first(names: &mut [String]) {
    names.sort_by(|a, b| match (timestamp_of(a), timestamp_of(b)) {
        (Some(ta), Some(tb)) => tb.cmp(&ta).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;

    // dotfiles like ".jpg" have no stem and therefore no extension
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }

    Some(ext)
}

fn sanitize_extension(ext: &str) -> Option<String> {
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_carry_timestamp_and_extension() {
        let name = generate_filename(1700000000123, Some("jpg"));

        assert!(name.starts_with("1700000000123-"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(timestamp_of(&name), Some(1700000000123));

        // millis, dash, 32 hex digits, dot, extension
        assert_eq!(name.len(), 13 + 1 + 32 + 1 + 3);
    }

    #[test]
    fn same_millisecond_names_differ() {
        let a = generate_filename(42, Some("jpg"));
        let b = generate_filename(42, Some("jpg"));

        assert_ne!(a, b);
    }

    #[test]
    fn extension_prefers_original_name() {
        assert_eq!(
            photo_extension(Some("photo.JPG"), Some("image/png")),
            Some(String::from("jpg"))
        );
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(
            photo_extension(Some("blob"), Some("image/jpeg")),
            Some(String::from("jpg"))
        );
        assert_eq!(
            photo_extension(None, Some("image/png")),
            Some(String::from("png"))
        );
    }

    #[test]
    fn listable_content_type_beats_unlisted_original_extension() {
        assert_eq!(
            photo_extension(Some("snap.gif"), Some("image/jpeg")),
            Some(String::from("jpg"))
        );
        assert_eq!(
            photo_extension(Some("snap.heic"), Some("image/png")),
            Some(String::from("png"))
        );

        // nothing listable on offer, so the original extension stands
        assert_eq!(
            photo_extension(Some("snap.gif"), Some("image/gif")),
            Some(String::from("gif"))
        );
        assert_eq!(
            photo_extension(Some("snap.gif"), None),
            Some(String::from("gif"))
        );
    }

    #[test]
    fn unusable_extensions_are_dropped() {
        assert_eq!(photo_extension(Some("evil.j/pg"), None), None);
        assert_eq!(photo_extension(Some("x.averyverylongext"), None), None);
        assert_eq!(photo_extension(Some(".jpg"), None), None);
        assert_eq!(photo_extension(None, None), None);
    }

    #[test]
    fn gallery_filter_is_case_insensitive() {
        assert!(is_gallery_image("a.jpg"));
        assert!(is_gallery_image("a.JPEG"));
        assert!(is_gallery_image("a.Png"));

        assert!(!is_gallery_image("a.gif"));
        assert!(!is_gallery_image("notes.txt"));
        assert!(!is_gallery_image("jpg"));
        assert!(!is_gallery_image(".png"));
    }

    #[test]
    fn sorts_newest_first_with_stragglers_last() {
        let mut names = vec![
            String::from("zebra.png"),
            String::from("100-a.jpg"),
            String::from("300-c.jpg"),
            String::from("apple.jpg"),
            String::from("200-b.png"),
        ];

        sort_newest_first(&mut names);

        assert_eq!(
            names,
            vec!["300-c.jpg", "200-b.png", "100-a.jpg", "apple.jpg", "zebra.png"]
        );
    }
}
