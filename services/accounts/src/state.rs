//! Application state shared across handlers

use crate::{repositories::UserRepository, session::SessionCodec};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: UserRepository,
    pub session_codec: SessionCodec,
    /// Whether session cookies carry the `Secure` attribute
    pub cookie_secure: bool,
}
