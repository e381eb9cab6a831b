//! Request middleware: session resolution and automatic `OPTIONS` replies

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header::ALLOW},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{AppState, session::SESSION_COOKIE};

/// Decode the `user` cookie and expose the identity to handlers
///
/// Handlers read it as `Option<Extension<SessionIdentity>>`. A missing,
/// tampered or expired cookie leaves the request anonymous.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match state.session_codec.decode(cookie.value()) {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(e) => debug!("Ignoring session cookie: {}", e),
        }
    }

    next.run(req).await
}

/// Answer `OPTIONS` for any route that does not handle it itself
///
/// The route's `405` is turned into an empty `200` whose `Allow` header lists
/// the route's methods plus `OPTIONS`. Unknown paths still get their `404`.
pub async fn automatic_options(req: Request<Body>, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let Some(allow) = response
        .headers()
        .get(ALLOW)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    else {
        return response;
    };

    match HeaderValue::from_str(&format!("{},OPTIONS", allow)) {
        Ok(allow) => (StatusCode::OK, [(ALLOW, allow)]).into_response(),
        Err(_) => response,
    }
}
