//! Error types for the accounts service
//!
//! Every variant is absorbed at the HTTP boundary: the browser only ever sees
//! a redirect to the home page.

use axum::response::{IntoResponse, Redirect, Response};
use common::error::DatabaseError;
use thiserror::Error;

use crate::session::SessionError;

/// Custom error type for account operations
#[derive(Error, Debug)]
pub enum AccountError {
    /// Submitted fields failed the format rules
    #[error("invalid input")]
    Validation,

    /// No account with the requested username
    #[error("user not found")]
    NotFound,

    /// Password did not match the stored hash
    #[error("credentials do not match")]
    Auth,

    /// The request carried no usable session cookie
    #[error("no valid session")]
    Unauthenticated,

    /// The user table could not serve the request
    #[error(transparent)]
    Store(#[from] DatabaseError),

    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// A blocking operation exceeded its time limit
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// The session cookie could not be produced
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AccountError {
    /// Failures caused by what the client submitted rather than by the service.
    pub fn is_rejection(&self) -> bool {
        match self {
            AccountError::Validation
            | AccountError::NotFound
            | AccountError::Auth
            | AccountError::Unauthenticated => true,
            AccountError::Store(e) => e.is_duplicate(),
            _ => false,
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        Redirect::to("/").into_response()
    }
}

/// Type alias for account results
pub type AccountResult<T> = Result<T, AccountError>;
