//! Opaque pagination cursors.
//!
//! A cursor is the unpadded base64url encoding of `{"page":N}`. Callers
//! should treat it as opaque; decoding is strict about the page number.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::error::{GatewayError, Result};

/// Encode a 1-based page number.
pub fn encode_cursor(page: u32) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::json!({ "page": page }).to_string())
}

/// Cursor for the page after `page`, if one can exist.
///
/// `None` when the current page came back empty or is the last
/// representable page.
pub fn next_cursor(page: u32, has_more: bool) -> Option<String> {
    if !has_more {
        return None;
    }
    page.checked_add(1).map(encode_cursor)
}

/// Decode a cursor back to its page number.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidCursor`] unless `cursor` is base64url of a
/// JSON object whose `page` is an integer of at least 1.
pub fn decode_cursor(cursor: &str) -> Result<u32> {
    let invalid = || GatewayError::InvalidCursor(cursor.to_owned());

    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.trim().trim_end_matches('='))
        .map_err(|_| invalid())?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|_| invalid())?;

    let page = value.get("page").ok_or_else(invalid)?;
    let page = match page.as_u64() {
        Some(n) => n,
        None => page
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u64)
            .ok_or_else(invalid)?,
    };

    u32::try_from(page)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(invalid)
}
