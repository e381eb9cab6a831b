//! Accounts service routes
//!
//! Every handler ends in one of two outcomes for the browser: proceed
//! (render, or redirect to `/internal`) or go back to `/`. Failures are
//! logged here with the operation and the username attempted.

use axum::{
    Extension, Form, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{AccountError, AccountResult},
    middleware::{automatic_options, session_middleware},
    models::{LoginCredentials, ProfileUpdate, Registration, SessionIdentity},
    pages,
    session::{clear_session_cookie, session_cookie},
};

/// Create the router for the accounts service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/internal", get(internal))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/update", post(update))
        .route("/logout", post(logout))
        .route("/health", get(health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(middleware::from_fn(automatic_options))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state)
}

fn log_failure(operation: &str, username: &str, err: &AccountError) {
    if err.is_rejection() {
        warn!("Failed {} as username: {} ({})", operation, username, err);
    } else {
        error!("Failed {} as username: {}: {}", operation, username, err);
    }
}

fn issue_session(state: &AppState, jar: CookieJar, username: &str) -> AccountResult<CookieJar> {
    let value = state
        .session_codec
        .encode(&SessionIdentity::new(username))?;

    Ok(jar.add(session_cookie(value, state.cookie_secure)))
}

/// Login and signup forms
pub async fn index() -> Html<&'static str> {
    Html(pages::index())
}

/// Profile page for the logged-in user
pub async fn internal(
    State(state): State<AppState>,
    identity: Option<Extension<SessionIdentity>>,
) -> AccountResult<Html<String>> {
    let Some(Extension(identity)) = identity else {
        return Err(AccountError::Unauthenticated);
    };

    let user = state
        .user_repository
        .find_by_username(&identity.username)
        .await
        .inspect_err(|e| log_failure("profile lookup", &identity.username, e))?;

    Ok(Html(pages::profile(&user)))
}

/// Create an account and log it in
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Option<Form<Registration>>,
) -> AccountResult<(CookieJar, Redirect)> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    if !form.is_complete() {
        let err = AccountError::Validation;
        log_failure("create and login", &form.username, &err);
        return Err(err);
    }

    let id = state
        .user_repository
        .insert(&form)
        .await
        .inspect_err(|e| log_failure("create and login", &form.username, e))?;

    let jar = issue_session(&state, jar, &form.username)
        .inspect_err(|e| log_failure("create and login", &form.username, e))?;

    info!(
        "Successful create and login as username: {}, id: {}",
        form.username, id
    );
    Ok((jar, Redirect::to("/internal")))
}

/// Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Option<Form<LoginCredentials>>,
) -> AccountResult<(CookieJar, Redirect)> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    if !form.is_complete() {
        let err = AccountError::Validation;
        log_failure("login", &form.username, &err);
        return Err(err);
    }

    let user = state
        .user_repository
        .authenticate(&form.username, &form.password)
        .await
        .inspect_err(|e| log_failure("login", &form.username, e))?;

    let jar = issue_session(&state, jar, &user.username)
        .inspect_err(|e| log_failure("login", &form.username, e))?;

    info!("Successful login as username: {}", user.username);
    Ok((jar, Redirect::to("/internal")))
}

/// Replace email and password of the logged-in user
pub async fn update(
    State(state): State<AppState>,
    identity: Option<Extension<SessionIdentity>>,
    form: Option<Form<ProfileUpdate>>,
) -> AccountResult<Redirect> {
    let Some(Extension(identity)) = identity else {
        warn!("Rejected profile update without a valid session");
        return Err(AccountError::Unauthenticated);
    };

    let form = form.map(|Form(form)| form).unwrap_or_default();
    if !form.is_complete() {
        return Ok(Redirect::to("/internal"));
    }

    state
        .user_repository
        .update(&identity.username, &form)
        .await
        .inspect_err(|e| log_failure("update", &identity.username, e))?;

    Ok(Redirect::to("/internal"))
}

/// Drop the session cookie
pub async fn logout(
    jar: CookieJar,
    identity: Option<Extension<SessionIdentity>>,
) -> (CookieJar, Redirect) {
    if let Some(Extension(identity)) = identity {
        info!("Logout as username: {}", identity.username);
    }

    (jar.add(clear_session_cookie()), Redirect::to("/"))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = match state.user_repository.health_check().await {
        Ok(up) => up,
        Err(e) => {
            error!("Health check failed: {}", e);
            false
        }
    };

    let status = if database_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if database_up { "ok" } else { "degraded" },
            "service": "accounts",
            "database": if database_up { "up" } else { "down" },
        })),
    )
}
