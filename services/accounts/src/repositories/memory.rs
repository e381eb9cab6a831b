//! In-memory user table
//!
//! Mirrors the PostgreSQL table closely enough for tests and local runs:
//! ids come from a sequence and usernames are unique.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::Mutex;

use crate::models::{NewUser, User};
use crate::repositories::UserTable;

#[derive(Debug, Default)]
struct Rows {
    next_id: i32,
    by_username: HashMap<String, User>,
}

/// User table held in process memory
#[derive(Debug, Default)]
pub struct MemoryUserTable {
    rows: Mutex<Rows>,
}

impl MemoryUserTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.rows.lock().await.by_username.len()
    }

    /// True when no user is stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserTable for MemoryUserTable {
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        Ok(self.rows.lock().await.by_username.get(username).cloned())
    }

    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<i32> {
        let mut rows = self.rows.lock().await;
        if rows.by_username.contains_key(&new_user.username) {
            return Err(DatabaseError::Duplicate("users_username_key".to_string()));
        }

        rows.next_id += 1;
        let id = rows.next_id;
        let now = Utc::now();
        rows.by_username.insert(
            new_user.username.clone(),
            User {
                id,
                username: new_user.username.clone(),
                email: new_user.email.clone(),
                password_hash: new_user.password_hash.clone(),
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn update_credentials(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> DatabaseResult<u64> {
        let mut rows = self.rows.lock().await;
        match rows.by_username.get_mut(username) {
            Some(user) => {
                user.email = email.to_string();
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
