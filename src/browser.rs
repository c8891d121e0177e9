//! Thin web-sys glue: file reads, cookies and URL handling.
use futures::future::join_all;
use leptos::{document, window};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, HtmlDocument, HtmlInputElement};

use crate::error::HistoryError;

async fn read_file(file: File) -> (String, Result<String, HistoryError>) {
    let name = file.name();
    let text = JsFuture::from(file.text())
        .await
        .map_err(|e| format!("{:?}", e))
        .and_then(|v| v.as_string().ok_or_else(|| "file is not text".to_string()))
        .map_err(|reason| HistoryError::Read { file: name.clone(), reason });
    (name, text)
}

/// Reads every selected file concurrently and returns once all are done.
pub async fn read_files(input: &HtmlInputElement) -> Vec<(String, Result<String, HistoryError>)> {
    let Some(list) = input.files() else {
        return Vec::new();
    };
    let files: Vec<File> = (0..list.length()).filter_map(|i| list.get(i)).collect();
    tracing::debug!(count = files.len(), "reading history files");
    join_all(files.into_iter().map(read_file)).await
}

fn html_document() -> Option<HtmlDocument> {
    document().dyn_into::<HtmlDocument>().ok()
}

pub fn cookies() -> String {
    html_document().and_then(|d| d.cookie().ok()).unwrap_or_default()
}

pub fn set_cookie(cookie: &str) {
    if let Some(Err(e)) = html_document().map(|d| d.set_cookie(cookie)) {
        tracing::warn!("could not set cookie: {:?}", e);
    }
}

pub fn current_path() -> String {
    window().location().pathname().unwrap_or_else(|_| "/".to_string())
}

pub fn current_search() -> String {
    window().location().search().unwrap_or_default()
}

pub fn current_href() -> String {
    window().location().href().unwrap_or_default()
}

pub fn navigate(path: &str) {
    if let Err(e) = window().location().set_href(path) {
        tracing::warn!(%path, "navigation failed: {:?}", e);
    }
}

/// Swaps the visible URL without reloading, used to drop the access token.
pub fn replace_url(path: &str) {
    let replaced = window()
        .history()
        .and_then(|h| h.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(path)));
    if let Err(e) = replaced {
        tracing::warn!("could not rewrite url: {:?}", e);
    }
}

pub fn open_external(url: &str) {
    if let Err(e) = window().open_with_url_and_target(url, "_blank") {
        tracing::warn!(%url, "could not open window: {:?}", e);
    }
}
