#![allow(non_snake_case)]
use dioxus::prelude::*;

use tracing::Level;

mod common;

mod booth;
use booth::Booth;

mod gallery;
use gallery::Gallery;

fn main() {
    dioxus_logger::init(Level::DEBUG).expect("failed to init logger");
    launch(App);
}

#[component]
pub fn App() -> Element {
    // bumped after every successful upload so the gallery refetches
    let refresh_signal = use_signal(|| 0u32);

    rsx! {
        style { "{common::style::BOOTH_STYLES}" }
        div {
            class: "container",
            h1 { class: "section-title", "Photobooth" }
            Booth { refresh_signal }
            Gallery { refresh_signal }
        }
    }
}
