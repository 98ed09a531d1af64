//! Loading packaged source images.

use js_sys::Uint8Array;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::dom::describe;

/// Errors that can occur while loading an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// A browser API call failed or returned an unexpected value.
    #[error("asset request failed: {0}")]
    Js(String),

    /// The server answered with a non-success status.
    #[error("{url} answered HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

impl From<JsValue> for AssetError {
    fn from(value: JsValue) -> Self {
        Self::Js(describe(&value))
    }
}

/// Fetch `url` and return the response body.
///
/// # Errors
///
/// Returns [`AssetError`] if the request fails, the response is not a
/// success, or the body cannot be read.
#[allow(clippy::future_not_send)] // WASM is single-threaded; JsFuture is !Send
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, AssetError> {
    let window = web_sys::window().ok_or_else(|| AssetError::Js("no global window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(AssetError::Status {
            url: url.to_owned(),
            status: response.status(),
        });
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}
