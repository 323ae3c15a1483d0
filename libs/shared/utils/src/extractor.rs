use axum::{body::Body, http::Request, middleware::Next, response::Response};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use shared_models::auth::Credential;

/// Read the caller's bearer token, if any. The token is never validated here;
/// it is forwarded as-is to the catalog and payment collaborators.
pub fn credential_from_headers(headers: &HeaderMap) -> Credential {
    match headers.typed_get::<Authorization<Bearer>>() {
        Some(auth) => Credential::bearer(auth.token()),
        None => {
            if headers.contains_key(AUTHORIZATION) {
                debug!("Ignoring non-bearer authorization header");
            }
            Credential::anonymous()
        }
    }
}

// Every booking route runs behind this so handlers can take Extension<Credential>.
pub async fn credential_middleware(mut request: Request<Body>, next: Next) -> Response {
    let credential = credential_from_headers(request.headers());
    request.extensions_mut().insert(credential);
    next.run(request).await
}
