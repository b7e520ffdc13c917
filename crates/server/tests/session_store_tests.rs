//! Session records are stored in the database and expired ones are deleted.

mod common;

use common::create_test_db;
use myauth::oauth2::session::{SqlSessionStore, remember_state, take_state};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tower_sessions::{Expiry, Session, session_store::ExpiredDeletion};

async fn stored_records(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT COUNT(*) AS n FROM tower_sessions",
        ))
        .await
        .unwrap()
        .expect("count row");
    row.try_get("", "n").unwrap()
}

async fn abandoned_login(store: &SqlSessionStore, expiry: Expiry) {
    let session = Session::new(None, Arc::new(store.clone()), Some(expiry));
    remember_state(&session, "never-returned").await.unwrap();
    session.save().await.unwrap();
}

#[tokio::test]
async fn test_expired_records_are_deleted() {
    let db = create_test_db().await;
    let store = SqlSessionStore::connect(&db).await.unwrap();

    let expired = Expiry::AtDateTime(OffsetDateTime::now_utc() - Duration::minutes(1));
    for _ in 0..50 {
        abandoned_login(&store, expired.clone()).await;
    }
    abandoned_login(&store, Expiry::OnInactivity(Duration::minutes(10))).await;
    assert_eq!(stored_records(&db).await, 51);

    store.delete_expired().await.unwrap();
    assert_eq!(stored_records(&db).await, 1);
}

#[tokio::test]
async fn test_state_survives_a_store_round_trip() {
    let db = create_test_db().await;
    let store = SqlSessionStore::connect(&db).await.unwrap();
    let expiry = Some(Expiry::OnInactivity(Duration::minutes(10)));

    let session = Session::new(None, Arc::new(store.clone()), expiry.clone());
    remember_state(&session, "abc").await.unwrap();
    session.save().await.unwrap();
    let id = session.id().expect("saved session has an id");

    let reloaded = Session::new(Some(id), Arc::new(store), expiry);
    assert_eq!(take_state(&reloaded).await.unwrap().as_deref(), Some("abc"));
    assert_eq!(take_state(&reloaded).await.unwrap(), None);
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let db = create_test_db().await;
    SqlSessionStore::connect(&db).await.unwrap();
    SqlSessionStore::connect(&db).await.unwrap();
}
