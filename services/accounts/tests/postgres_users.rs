//! PostgreSQL user table tests
//!
//! Each test gets a fresh database with the migrations applied. They need a
//! reachable `DATABASE_URL` and are ignored by default.

use std::sync::Arc;

use accounts::{
    error::AccountError,
    models::{NewUser, ProfileUpdate, Registration},
    password::CredentialHasher,
    repositories::{PgUserTable, Timeouts, UserRepository, UserTable},
};
use argon2::Params;
use sqlx::PgPool;

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "$argon2id$stub".to_string(),
    }
}

fn repository(pool: PgPool) -> UserRepository {
    UserRepository::new(
        Arc::new(PgUserTable::new(pool)),
        CredentialHasher::new(Params::MIN_M_COST, 1).unwrap(),
        Timeouts::default(),
    )
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
async fn test_insert_and_find(pool: PgPool) {
    let table = PgUserTable::new(pool);
    let id = table.insert(&new_user("alice")).await.unwrap();

    let user = table.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.email, "alice@example.com");
    assert!(table.find_by_username("Alice").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
async fn test_unique_constraint_maps_to_duplicate(pool: PgPool) {
    let table = PgUserTable::new(pool);
    table.insert(&new_user("alice")).await.unwrap();

    let err = table.insert(&new_user("alice")).await.unwrap_err();
    assert!(err.is_duplicate());
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
async fn test_concurrent_inserts_admit_exactly_one(pool: PgPool) {
    let table = Arc::new(PgUserTable::new(pool));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let table = table.clone();
            tokio::spawn(async move { table.insert(&new_user("carol")).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(e.is_duplicate(), "unexpected error: {}", e),
        }
    }
    assert_eq!(successes, 1);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
async fn test_update_credentials_counts_rows(pool: PgPool) {
    let table = PgUserTable::new(pool);
    table.insert(&new_user("alice")).await.unwrap();

    let changed = table
        .update_credentials("alice", "alice@example.org", "$argon2id$other")
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let user = table.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.email, "alice@example.org");
    assert_eq!(user.password_hash, "$argon2id$other");
    assert!(user.updated_at >= user.created_at);

    let missing = table
        .update_credentials("bob", "bob@example.org", "$argon2id$other")
        .await
        .unwrap();
    assert_eq!(missing, 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
async fn test_repository_round_trip(pool: PgPool) {
    let repo = repository(pool);
    let registration = Registration {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "secret1".into(),
    };
    repo.insert(&registration).await.unwrap();

    assert!(repo.authenticate("alice", "secret1").await.is_ok());
    assert!(matches!(
        repo.authenticate("alice", "wrong1").await,
        Err(AccountError::Auth)
    ));

    let update = ProfileUpdate {
        email: "alice@example.org".into(),
        password: "newsecret".into(),
    };
    repo.update("alice", &update).await.unwrap();
    assert!(repo.authenticate("alice", "newsecret").await.is_ok());
    assert!(repo.health_check().await.unwrap());
}
