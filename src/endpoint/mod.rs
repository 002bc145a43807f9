//! Transport endpoint derivation.
//!
//! The backend does not advertise its endpoints; the client derives them
//! from the page URL the way the original pages did (`http` family swapped
//! for the `ws` family, fixed path segments substituted). This is brittle by
//! construction and depends on the backend exposing the derived paths.

use url::Url;

use crate::error::{ClientError, Result};

/// Path segment the WebSocket page is served under.
const WEBSOCKET_PAGE: &str = "websockets.html";

/// Path the duplex endpoint is mounted at, relative to the page directory.
const WEBSOCKET_PATH: &str = "ws";

/// Fixed path of the server-push event stream.
const EVENTS_PATH: &str = "/events";

/// Derive the duplex WebSocket endpoint from the page URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, and a trailing
/// `websockets.html` segment is replaced with `ws`. A page URL without that
/// segment falls back to `/ws`. Query parameters are carried through
/// untouched, matching the original whole-href substitution.
pub fn derive_websocket_url(page_url: &str) -> Result<Url> {
    let mut url = parse_page_url(page_url)?;

    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(ClientError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::UnsupportedScheme(page_url.to_string()))?;

    let path = url.path().to_string();
    let ws_path = match path.strip_suffix(WEBSOCKET_PAGE) {
        Some(dir) => format!("{}{}", dir, WEBSOCKET_PATH),
        None => format!("/{}", WEBSOCKET_PATH),
    };
    url.set_path(&ws_path);
    url.set_fragment(None);

    Ok(url)
}

/// Derive the server-push event stream endpoint from the page URL.
///
/// The stream lives at the fixed origin-relative path `/events`; query and
/// fragment are dropped, as they would be by a relative `/events` fetch.
pub fn derive_sse_url(page_url: &str) -> Result<Url> {
    let mut url = parse_page_url(page_url)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::UnsupportedScheme(url.scheme().to_string()));
    }

    url.set_path(EVENTS_PATH);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

fn parse_page_url(page_url: &str) -> Result<Url> {
    Ok(Url::parse(page_url)?)
}
