// ABOUTME: Builders for MCP-UI resources that clients render inline as HTML or an iframe
// ABOUTME: Produces embedded resources with the ui:// scheme and the matching MIME type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # UI resources
//!
//! A UI resource is an ordinary embedded resource whose URI uses the `ui://`
//! scheme. The MIME type tells the client how to render `text`:
//! `text/html` is inline markup, `text/uri-list` is a URL to frame.

use super::capabilities::{ContentBlock, EmbeddedResource};
use crate::errors::{AppError, AppResult};

/// URI scheme every UI resource must use
pub const UI_SCHEME: &str = "ui://";
/// MIME type of inline HTML UI resources
pub const MIME_RAW_HTML: &str = "text/html";
/// MIME type of external URL UI resources
pub const MIME_EXTERNAL_URL: &str = "text/uri-list";

/// Inline HTML rendered by the client
///
/// # Errors
///
/// Returns an error if `uri` does not use the `ui://` scheme
pub fn raw_html(uri: &str, html: &str) -> AppResult<EmbeddedResource> {
    build(uri, MIME_RAW_HTML, html)
}

/// External page the client loads in an iframe
///
/// # Errors
///
/// Returns an error if `uri` does not use the `ui://` scheme
pub fn external_url(uri: &str, iframe_url: &str) -> AppResult<EmbeddedResource> {
    build(uri, MIME_EXTERNAL_URL, iframe_url)
}

/// The resource wrapped as a JSON string inside a text block
///
/// For clients that only read text content and parse the UI resource out of it.
///
/// # Errors
///
/// Returns an error if the resource cannot be serialized
pub fn as_text_block(resource: EmbeddedResource) -> AppResult<ContentBlock> {
    let block = ContentBlock::resource(resource);
    Ok(ContentBlock::text(serde_json::to_string(&block)?))
}

fn build(uri: &str, mime_type: &str, text: &str) -> AppResult<EmbeddedResource> {
    if !uri.starts_with(UI_SCHEME) {
        return Err(AppError::invalid_input(format!(
            "UI resource URI must start with '{UI_SCHEME}', got '{uri}'"
        )));
    }
    Ok(EmbeddedResource {
        uri: uri.to_owned(),
        mime_type: mime_type.to_owned(),
        text: text.to_owned(),
    })
}
