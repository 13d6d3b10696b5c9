//! Requesting-user identity
//!
//! Identity comes from headers set by the authenticating proxy in front of
//! the server. It is display-only: the view shows who is looking at the
//! document, and the viewer key picks which per-viewer view serves the
//! request. No access decisions are made from it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::HeaderMap;
use axum::http::request::Parts;

/// Label used when no name or email is supplied
pub const UNKNOWN_USER: &str = "Unknown user";

/// Viewer key for requests without any identity headers
pub const ANONYMOUS_VIEWER: &str = "anonymous";

/// Identity headers of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
    pub viewer_id: Option<String>,
}

impl Identity {
    pub const NAME: &'static str = "x-user-name";
    pub const EMAIL: &'static str = "x-user-email";
    pub const VIEWER_ID: &'static str = "x-viewer-id";

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            name: get_header_str(headers, Self::NAME).map(str::to_string),
            email: get_header_str(headers, Self::EMAIL).map(str::to_string),
            viewer_id: get_header_str(headers, Self::VIEWER_ID).map(str::to_string),
        }
    }

    /// Name shown as the requester: name, then email, then a placeholder
    pub fn requested_by(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(UNKNOWN_USER)
    }

    /// Key selecting this requester's view
    pub fn viewer_key(&self) -> &str {
        self.viewer_id
            .as_deref()
            .or(self.email.as_deref())
            .or(self.name.as_deref())
            .unwrap_or(ANONYMOUS_VIEWER)
    }
}

/// Trimmed, non-empty header value
fn get_header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity::from_headers(&parts.headers))
    }
}
