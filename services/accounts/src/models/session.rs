//! Identity carried inside the session cookie

use serde::{Deserialize, Serialize};

/// Claim stored client-side; the server keeps no copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub username: String,
}

impl SessionIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
