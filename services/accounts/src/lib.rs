//! Accounts service
//!
//! Signup, login, logout and profile updates for a single users table.
//! The logged-in user is carried in a signed and encrypted `user` cookie;
//! passwords are stored as Argon2id hashes.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod validation;

pub use state::AppState;
