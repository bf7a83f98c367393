pub mod dataurl;
pub mod requests;
pub mod style;

use wasm_bindgen::JsValue;

// JsValue does not implement std::error::Error, so it has to be flattened
// into a message before it can travel through anyhow
pub fn js_err(err: JsValue) -> anyhow::Error {
    anyhow::Error::msg(
        err.as_string()
            .unwrap_or_else(|| format!("javascript error: {err:?}")),
    )
}

pub fn window() -> anyhow::Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| anyhow::Error::msg("no global window"))
}

// blocking alert, which is the only way errors are surfaced to the booth user
pub fn alert(message: &str) {
    if let Ok(window) = window() {
        let _ = window.alert_with_message(message);
    }
}
