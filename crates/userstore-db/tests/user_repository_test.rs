//! Integration tests for the User repository using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tokio_util::sync::CancellationToken;
use userstore_core::error::{Operation, StoreError};
use userstore_core::models::user::{CreateUser, User};
use userstore_core::repository::UserRepository;
use userstore_core::with_cancellation;
use userstore_db::SurrealUserRepository;

/// Well-formed key that no test ever creates.
const ABSENT_ID: &str = "zzzzzzzzzzzzzzzzzzzz";

/// Helper: spin up in-memory DB and bootstrap the user table.
async fn setup() -> SurrealUserRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    userstore_db::run_migrations(&db, "user").await.unwrap();
    SurrealUserRepository::new(db, "user")
}

fn archy() -> User {
    User::from(CreateUser {
        username: "Archy".into(),
        password_hash: "hash".into(),
        email: "my@example.com".into(),
    })
}

#[tokio::test]
async fn create_and_find_user() {
    let repo = setup().await;

    let id = repo.create(archy()).await.unwrap();
    assert_eq!(id.len(), 20);

    let fetched = repo.find_one(&id).await.unwrap();
    assert_eq!(
        fetched,
        User {
            id: Some(id.clone()),
            ..archy()
        }
    );

    // The client-facing face drops the credential material.
    let json = serde_json::to_value(&fetched).unwrap();
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["username"], "Archy");
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn create_ignores_supplied_id() {
    let repo = setup().await;

    let user = User {
        id: Some(ABSENT_ID.into()),
        ..archy()
    };
    let id = repo.create(user).await.unwrap();
    assert_ne!(id, ABSENT_ID);

    let err = repo.find_one(ABSENT_ID).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_users_are_allowed() {
    let repo = setup().await;

    let first = repo.create(archy()).await.unwrap();
    let second = repo.create(archy()).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn find_missing_user_is_not_found() {
    let repo = setup().await;

    let err = repo.find_one(ABSENT_ID).await.unwrap_err();
    match err {
        StoreError::NotFound { entity, id } => {
            assert_eq!(entity, "user");
            assert_eq!(id, ABSENT_ID);
        }
        other => panic!("expected NotFound, got {other}"),
    }
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let repo = setup().await;

    for bad in ["", "not-an-id", "zzzzzzzzzzzzzzzzzzz!", "zzzzzzzzzzzzzzzzzzzzz"] {
        assert!(
            matches!(
                repo.find_one(bad).await,
                Err(StoreError::InvalidIdentifier { .. })
            ),
            "find_one({bad:?})"
        );
        assert!(
            matches!(
                repo.delete(bad).await,
                Err(StoreError::InvalidIdentifier { .. })
            ),
            "delete({bad:?})"
        );
        let user = User {
            id: Some(bad.to_string()),
            ..archy()
        };
        assert!(
            matches!(
                repo.update(user).await,
                Err(StoreError::InvalidIdentifier { .. })
            ),
            "update({bad:?})"
        );
    }
}

#[tokio::test]
async fn update_replaces_mutable_fields() {
    let repo = setup().await;
    let id = repo.create(archy()).await.unwrap();

    repo.update(User {
        id: Some(id.clone()),
        username: "Archy2".into(),
        password_hash: "hash2".into(),
        email: "new@example.com".into(),
    })
    .await
    .unwrap();

    let fetched = repo.find_one(&id).await.unwrap();
    assert_eq!(fetched.id.as_deref(), Some(id.as_str()));
    assert_eq!(fetched.username, "Archy2");
    assert_eq!(fetched.password_hash, "hash2");
    assert_eq!(fetched.email, "new@example.com");
}

#[tokio::test]
async fn update_only_touches_its_record() {
    let repo = setup().await;
    let first = repo.create(archy()).await.unwrap();
    let second = repo.create(archy()).await.unwrap();

    repo.update(User {
        id: Some(first.clone()),
        username: "Renamed".into(),
        ..archy()
    })
    .await
    .unwrap();

    assert_eq!(repo.find_one(&first).await.unwrap().username, "Renamed");
    assert_eq!(repo.find_one(&second).await.unwrap().username, "Archy");
}

#[tokio::test]
async fn update_without_id_is_invalid() {
    let repo = setup().await;

    let err = repo.update(archy()).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidIdentifier { .. }));
}

#[tokio::test]
async fn update_missing_user_is_not_found() {
    let repo = setup().await;

    let err = repo
        .update(User {
            id: Some(ABSENT_ID.into()),
            ..archy()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    // Updating must not have created the record.
    assert!(matches!(
        repo.find_one(ABSENT_ID).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_twice_is_not_found() {
    let repo = setup().await;
    let id = repo.create(archy()).await.unwrap();

    repo.delete(&id).await.unwrap();

    let err = repo.delete(&id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = repo.find_one(&id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_missing_user_is_not_found() {
    let repo = setup().await;

    let err = repo.delete(ABSENT_ID).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn repositories_on_different_tables_are_isolated() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    userstore_db::run_migrations(&db, "user").await.unwrap();
    userstore_db::run_migrations(&db, "archived_user").await.unwrap();

    let live = SurrealUserRepository::new(db.clone(), "user");
    let archive = SurrealUserRepository::new(db, "archived_user");
    assert_eq!(archive.table(), "archived_user");

    let id = live.create(archy()).await.unwrap();
    assert!(matches!(
        archive.find_one(&id).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn concurrent_creates_share_one_handle() {
    let repo = setup().await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.create(User {
                    username: format!("user{i}"),
                    ..archy()
                })
                .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn cancelled_call_reports_cancellation() {
    let repo = setup().await;
    let token = CancellationToken::new();
    token.cancel();

    let err = with_cancellation(&token, Operation::Create, repo.create(archy()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Cancelled {
            operation: Operation::Create
        }
    ));
}

#[tokio::test]
async fn find_with_undecodable_record_is_decoding_failure() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Schemaless table, so the store accepts a record the model cannot read.
    db.query("CREATE loose:abcdefghijklmnopqrst SET username = 42, email = 'x'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let repo = SurrealUserRepository::new(db, "loose");
    let err = repo.find_one("abcdefghijklmnopqrst").await.unwrap_err();
    match &err {
        StoreError::Decoding { operation, id, .. } => {
            assert_eq!(*operation, Operation::FindOne);
            assert_eq!(id, "abcdefghijklmnopqrst");
        }
        other => panic!("expected Decoding, got {other}"),
    }
    assert!(err.is_fatal());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn failing_query_is_storage_failure() {
    // No namespace or database selected: every query is rejected.
    let db = Surreal::new::<Mem>(()).await.unwrap();
    let repo = SurrealUserRepository::new(db, "user");

    let err = repo.find_one(ABSENT_ID).await.unwrap_err();
    match &err {
        StoreError::Storage { operation, id, .. } => {
            assert_eq!(*operation, Operation::FindOne);
            assert_eq!(id, ABSENT_ID);
        }
        other => panic!("expected Storage, got {other}"),
    }
    assert!(err.is_retryable());

    assert!(matches!(
        repo.delete(ABSENT_ID).await,
        Err(StoreError::Storage {
            operation: Operation::Delete,
            ..
        })
    ));
}

#[tokio::test]
async fn schema_rejection_on_create_is_storage_failure() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    db.query(
        "DEFINE TABLE strict SCHEMAFULL;
         DEFINE FIELD username ON TABLE strict TYPE string;
         DEFINE FIELD password_hash ON TABLE strict TYPE string;
         DEFINE FIELD email ON TABLE strict TYPE string \
             ASSERT string::is_email($value);",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let repo = SurrealUserRepository::new(db, "strict");
    let err = repo
        .create(User {
            email: "not an email".into(),
            ..archy()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Storage {
            operation: Operation::Create,
            ..
        }
    ));
}
