//! Accounts service models

pub mod session;
pub mod user;

// Re-export for convenience
pub use session::SessionIdentity;
pub use user::{LoginCredentials, NewUser, ProfileUpdate, Registration, User};
