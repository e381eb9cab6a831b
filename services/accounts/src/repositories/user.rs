//! User repository for account operations

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use tracing::info;

use crate::{
    error::{AccountError, AccountResult},
    models::{NewUser, ProfileUpdate, Registration, User},
    password::CredentialHasher,
    validation::validate_account,
};

/// Row-level access to the user table
#[async_trait]
pub trait UserTable: Send + Sync {
    /// Exact-match lookup by username
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// Insert a row and return its generated id
    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<i32>;

    /// Replace password hash and email of the row matching `username`,
    /// returning the number of rows changed
    async fn update_credentials(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> DatabaseResult<u64>;

    /// Check that the table can be reached
    async fn health_check(&self) -> DatabaseResult<bool>;
}

/// Time limits applied to store and hashing calls
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub query: Duration,
    pub hash: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            query: Duration::from_secs(5),
            hash: Duration::from_secs(5),
        }
    }
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    table: Arc<dyn UserTable>,
    hasher: CredentialHasher,
    timeouts: Timeouts,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(table: Arc<dyn UserTable>, hasher: CredentialHasher, timeouts: Timeouts) -> Self {
        Self {
            table,
            hasher,
            timeouts,
        }
    }

    /// Run a table call under the query timeout.
    ///
    /// On [`DatabaseError::Timeout`] the outcome in the store is unknown: a
    /// write may still have committed after the caller gave up.
    async fn bounded<T>(&self, call: impl Future<Output = DatabaseResult<T>>) -> DatabaseResult<T> {
        tokio::time::timeout(self.timeouts.query, call)
            .await
            .map_err(|_| DatabaseError::Timeout(self.timeouts.query))?
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> AccountResult<User> {
        self.bounded(self.table.find_by_username(username))
            .await?
            .ok_or(AccountError::NotFound)
    }

    /// Validate, hash and insert a new account, returning its id
    ///
    /// A timeout leaves it unknown whether the row was created.
    pub async fn insert(&self, registration: &Registration) -> AccountResult<i32> {
        validate_account(
            &registration.username,
            &registration.email,
            &registration.password,
        )?;

        let password_hash = self
            .hasher
            .hash_blocking(&registration.password, self.timeouts.hash)
            .await?;

        let new_user = NewUser {
            username: registration.username.clone(),
            email: registration.email.clone(),
            password_hash,
        };

        let id = self.bounded(self.table.insert(&new_user)).await?;
        info!("Created user {} with id {}", new_user.username, id);
        Ok(id)
    }

    /// Validate, rehash and replace the password and email of `username`
    ///
    /// A timeout leaves it unknown whether the row was changed.
    pub async fn update(&self, username: &str, update: &ProfileUpdate) -> AccountResult<()> {
        validate_account(username, &update.email, &update.password)?;

        let password_hash = self
            .hasher
            .hash_blocking(&update.password, self.timeouts.hash)
            .await?;

        let changed = self
            .bounded(
                self.table
                    .update_credentials(username, &update.email, &password_hash),
            )
            .await?;

        if changed == 0 {
            return Err(AccountError::NotFound);
        }

        info!("Updated credentials for user {}", username);
        Ok(())
    }

    /// Look up a user and check the password
    pub async fn authenticate(&self, username: &str, password: &str) -> AccountResult<User> {
        let user = self.find_by_username(username).await?;

        let matched = self
            .hasher
            .verify_blocking(&user.password_hash, password, self.timeouts.hash)
            .await?;

        if matched {
            Ok(user)
        } else {
            Err(AccountError::Auth)
        }
    }

    /// Check that the user table can be reached
    pub async fn health_check(&self) -> AccountResult<bool> {
        Ok(self.bounded(self.table.health_check()).await?)
    }
}
