//! Shared helpers for accounts integration tests

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accounts::{
    AppState,
    password::CredentialHasher,
    repositories::{MemoryUserTable, Timeouts, UserRepository},
    routes::create_router,
    session::{DEFAULT_MAX_AGE, SESSION_COOKIE, SessionCodec, SessionKeys},
};
use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;

pub struct TestApp {
    pub router: Router,
    pub codec: SessionCodec,
    pub table: Arc<MemoryUserTable>,
}

pub fn test_app() -> TestApp {
    let table = Arc::new(MemoryUserTable::new());
    let codec = SessionCodec::new(
        &SessionKeys::generate(),
        Duration::from_secs(DEFAULT_MAX_AGE),
    )
    .unwrap();

    let user_repository = UserRepository::new(
        table.clone(),
        CredentialHasher::new(Params::MIN_M_COST, 1).unwrap(),
        Timeouts::default(),
    );

    let state = AppState {
        user_repository,
        session_codec: codec.clone(),
        cookie_secure: false,
    };

    TestApp {
        router: create_router(state),
        codec,
        table,
    }
}

impl TestApp {
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, cookie));
        }

        self.router
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    pub async fn options(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method("OPTIONS")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, cookie));
        }

        self.router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Sign up and return the session cookie value
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .post_form(
                "/signup",
                &format!("username={}&email={}&password={}", username, email, password),
                None,
            )
            .await;
        assert_eq!(location(&response), Some("/internal"));
        session_value(&response).expect("signup should set a session cookie")
    }
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", SESSION_COOKIE)))
        .map(str::to_string)
}

pub fn session_value(response: &Response<Body>) -> Option<String> {
    let header = set_cookie(response)?;
    let pair = header.split(';').next()?;
    let (_, value) = pair.split_once('=')?;
    Some(value.to_string())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Log output captured for the current thread
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route `tracing` output of the current thread into a buffer until the
/// guard is dropped
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    (logs, tracing::subscriber::set_default(subscriber))
}
