use dioxus::prelude::*;
use tracing::{debug, error};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, MediaStream};

use crate::common::{alert, js_err, requests::upload_photo, window};

const VIDEO_ID: &str = "booth-video";

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;

// decorative frame stroked onto every capture
const BORDER_COLOR: &str = "#e17055";
const BORDER_WIDTH: f64 = 10.0;
const BORDER_INSET: f64 = 5.0;

const CAPTURE_MIME: &str = "image/jpeg";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Camera {
    Pending,
    Ready,
    Unavailable,
}

#[derive(Clone, Debug, PartialEq)]
enum BoothState {
    Live,
    // holds the jpeg data url of the frozen frame
    Previewing(String),
}

fn video_element() -> anyhow::Result<HtmlVideoElement> {
    window()?
        .document()
        .ok_or_else(|| anyhow::Error::msg("no document"))?
        .get_element_by_id(VIDEO_ID)
        .ok_or_else(|| anyhow::Error::msg("video element is not mounted"))?
        .dyn_into::<HtmlVideoElement>()
        .map_err(|_| anyhow::Error::msg("booth-video is not a video element"))
}

async fn start_camera() -> anyhow::Result<()> {
    let devices = window()?.navigator().media_devices().map_err(js_err)?;

    let video = js_sys::Object::new();
    js_sys::Reflect::set(&video, &"width".into(), &JsValue::from(CAPTURE_WIDTH)).map_err(js_err)?;
    js_sys::Reflect::set(&video, &"height".into(), &JsValue::from(CAPTURE_HEIGHT))
        .map_err(js_err)?;

    let constraints = web_sys::MediaStreamConstraints::new();
    constraints.set_video(&video);

    let stream: MediaStream = JsFuture::from(
        devices
            .get_user_media_with_constraints(&constraints)
            .map_err(js_err)?,
    )
    .await
    .map_err(js_err)?
    .dyn_into()
    .map_err(|_| anyhow::Error::msg("getUserMedia did not return a stream"))?;

    let element = video_element()?;
    element.set_src_object(Some(&stream));
    JsFuture::from(element.play().map_err(js_err)?)
        .await
        .map_err(js_err)?;

    Ok(())
}

// draws the current frame plus the border onto an offscreen canvas of the
// same size and returns it as a jpeg data url
fn capture_frame() -> anyhow::Result<String> {
    let video = video_element()?;

    let (width, height) = (video.video_width(), video.video_height());
    if width == 0 || height == 0 {
        return Err(anyhow::Error::msg("the camera has not produced a frame yet"));
    }

    let canvas = window()?
        .document()
        .ok_or_else(|| anyhow::Error::msg("no document"))?
        .create_element("canvas")
        .map_err(js_err)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow::Error::msg("failed to create canvas"))?;

    canvas.set_width(width);
    canvas.set_height(height);

    let ctx = canvas
        .get_context("2d")
        .map_err(js_err)?
        .ok_or_else(|| anyhow::Error::msg("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| anyhow::Error::msg("unexpected canvas context type"))?;

    let (width, height) = (f64::from(width), f64::from(height));

    ctx.draw_image_with_html_video_element_and_dw_and_dh(&video, 0.0, 0.0, width, height)
        .map_err(js_err)?;

    ctx.set_stroke_style_str(BORDER_COLOR);
    ctx.set_line_width(BORDER_WIDTH);
    ctx.stroke_rect(
        BORDER_INSET,
        BORDER_INSET,
        width - 2.0 * BORDER_INSET,
        height - 2.0 * BORDER_INSET,
    );

    canvas.to_data_url_with_type(CAPTURE_MIME).map_err(js_err)
}

#[derive(Clone, PartialEq, Props)]
pub struct BoothProps {
    refresh_signal: Signal<u32>,
}

#[component]
pub fn Booth(props: BoothProps) -> Element {
    let mut refresh_signal = props.refresh_signal;

    let mut camera = use_signal(|| Camera::Pending);
    let mut state = use_signal(|| BoothState::Live);
    let mut saving = use_signal(|| false);

    // the video element has to exist before the stream can be bound to it
    use_effect(move || {
        spawn(async move {
            match start_camera().await {
                Ok(()) => {
                    debug!("camera started");
                    camera.set(Camera::Ready);
                }
                Err(err) => {
                    error!({ error = %err }, "camera unavailable");
                    camera.set(Camera::Unavailable);
                    alert(&format!("Could not access the camera: {err}"));
                }
            }
        });
    });

    let on_capture = move |_| match capture_frame() {
        Ok(data_url) => state.set(BoothState::Previewing(data_url)),
        Err(err) => {
            error!({ error = %err }, "capture failed");
            alert(&format!("Capture failed: {err}"));
        }
    };

    let on_save = move |_| {
        let BoothState::Previewing(data_url) = state() else {
            return;
        };

        spawn(async move {
            saving.set(true);

            match upload_photo(&data_url).await {
                Ok(resp) => {
                    debug!({ reference = resp.reference() }, "photo saved");
                    state.set(BoothState::Live);
                    refresh_signal.with_mut(|n| *n += 1);
                }
                // the preview stays up so the user can try again
                Err(err) => {
                    error!({ error = %err }, "upload failed");
                    alert(&format!("Upload failed: {err}"));
                }
            }

            saving.set(false);
        });
    };

    let previewing = matches!(*state.read(), BoothState::Previewing(_));

    rsx! {
        div {
            class: "booth",
            video {
                id: VIDEO_ID,
                autoplay: true,
                playsinline: true,
                muted: true,
                display: if previewing { "none" } else { "block" },
            }
            if let BoothState::Previewing(data_url) = &*state.read() {
                img { src: "{data_url}" }
            }
            div {
                class: "booth-controls",
                if previewing {
                    button {
                        class: "btn btn-secondary",
                        disabled: saving(),
                        onclick: move |_| state.set(BoothState::Live),
                        "Retake"
                    }
                    button {
                        class: "btn",
                        disabled: saving(),
                        onclick: on_save,
                        if saving() { "Saving..." } else { "Save" }
                    }
                } else {
                    button {
                        class: "btn",
                        disabled: camera() != Camera::Ready,
                        onclick: on_capture,
                        "Capture"
                    }
                }
            }
        }
    }
}
