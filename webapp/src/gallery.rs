use dioxus::prelude::*;

use crate::common::requests::list_photos;
use api::photo_src;

#[derive(Clone, PartialEq, Props)]
pub struct GalleryProps {
    refresh_signal: Signal<u32>,
}

#[component]
pub fn Gallery(props: GalleryProps) -> Element {
    let refresh_signal = props.refresh_signal;

    // reading the signal subscribes the resource, so every upload refetches
    let photos = use_resource(move || async move {
        let _ = refresh_signal();
        list_photos().await
    });

    rsx! {
        match &*photos.read() {
            Some(Ok(resp)) => rsx! {
                div {
                    class: "gallery-grid",
                    for reference in resp.images.iter() {
                        img {
                            key: "{reference}",
                            src: photo_src(reference),
                        }
                    }
                }
            },
            Some(Err(err)) => rsx! {
                p { class: "gallery-status", "Error loading gallery: {err}" }
            },
            None => rsx! {
                p { class: "gallery-status", "Loading..." }
            },
        }
    }
}
