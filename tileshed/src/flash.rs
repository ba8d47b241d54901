//! One-time flash messages.
//!
//! A [`Flash`] is a per-request context object carrying transient message
//! slots. Handlers construct one, fill exactly one slot (success or error),
//! and hand it back as part of their outcome; it never outlives the request
//! that produced it except as a cookie.
//!
//! Across a redirect the flash travels in the `tileshed_flash` cookie
//! (base64-encoded JSON). The next page read consumes it: the listing
//! endpoint echoes the messages in its body and sets an expired cookie so
//! the flash is displayed exactly once.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cookie name used to carry a flash across a redirect
pub const FLASH_COOKIE: &str = "tileshed_flash";

/// Transient per-request message slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    /// Success messages, displayed once on the next rendered page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success: Vec<String>,
    /// Error messages, displayed once on the next rendered page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<String>,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: vec![message.into()],
            error: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: Vec::new(),
            error: vec![message.into()],
        }
    }

    pub fn errors(messages: Vec<String>) -> Self {
        Self {
            success: Vec::new(),
            error: messages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }

    /// Serialize into a short-lived Set-Cookie header value
    pub fn to_cookie(&self) -> String {
        let payload = serde_json::to_string(self).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        format!("{FLASH_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax; Max-Age=60")
    }

    /// Set-Cookie header value that clears a consumed flash
    pub fn clear_cookie() -> String {
        format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }

    /// Extract a flash from a request Cookie header, if one is present
    pub fn from_cookie_header(header: &str) -> Option<Flash> {
        let encoded = header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == FLASH_COOKIE && !value.is_empty()).then(|| value.to_string())
        })?;

        let payload = URL_SAFE_NO_PAD.decode(encoded.as_bytes()).ok()?;
        serde_json::from_slice(&payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_round_trips_through_cookie() {
        let flash = Flash::success("You have successfully uploaded an image with title of Fatma image!");
        let set_cookie = flash.to_cookie();

        // The browser sends back only the name=value pair
        let cookie_pair = set_cookie.split(';').next().unwrap();
        let recovered = Flash::from_cookie_header(cookie_pair).unwrap();

        assert_eq!(recovered, flash);
    }

    #[test]
    fn flash_is_found_among_other_cookies() {
        let flash = Flash::errors(vec!["error".to_string()]);
        let pair = flash.to_cookie().split(';').next().unwrap().to_string();
        let header = format!("session=abc123; {pair}; theme=dark");

        assert_eq!(Flash::from_cookie_header(&header), Some(flash));
    }

    #[test]
    fn missing_or_cleared_cookie_yields_none() {
        assert_eq!(Flash::from_cookie_header("session=abc123"), None);
        assert_eq!(Flash::from_cookie_header("tileshed_flash="), None);
        assert_eq!(Flash::from_cookie_header("tileshed_flash=not-base64!"), None);
    }
}
