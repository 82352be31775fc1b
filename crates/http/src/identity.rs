//! Caller identity supplied by the authenticating proxy in front of the app.

use axum::extract::{FromRequestParts, OptionalFromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::found;

/// Header carrying the stable user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user's display name
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Authenticated user taken from the `x-user-id` / `x-user-name` headers.
///
/// Extract `Option<CurrentUser>` where identity is optional. Extracting
/// `CurrentUser` directly redirects anonymous callers to `/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
}

impl CurrentUser {
    fn from_parts(parts: &Parts) -> Option<Self> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let id = header(USER_ID_HEADER);
        if id.is_empty() {
            return None;
        }

        Some(Self {
            id,
            display_name: header(USER_NAME_HEADER),
        })
    }
}

/// Redirect to the login page, remembering where the caller was going.
#[derive(Debug)]
pub struct LoginRedirect {
    return_to: String,
}

impl LoginRedirect {
    /// Login URL with the return path form-encoded into `redirect`.
    fn location(&self) -> String {
        match serde_urlencoded::to_string([("redirect", self.return_to.as_str())]) {
            Ok(query) => format!("/login?{query}"),
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode login redirect target");
                "/login".to_string()
            }
        }
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        found(&self.location())
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or_else(|| {
            let return_to = parts
                .extensions
                .get::<OriginalUri>()
                .map(|original| original.0.path().to_string())
                .unwrap_or_else(|| parts.uri.path().to_string());
            tracing::debug!(%return_to, "anonymous request needs login");
            LoginRedirect { return_to }
        })
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
