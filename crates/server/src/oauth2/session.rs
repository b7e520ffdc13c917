//! Per-browser session storage.
//!
//! Every route runs behind the session layer, so handlers always receive a
//! [`Session`]. Records live in the application database next to the `user`
//! table and expire after the configured inactivity window; a background task
//! deletes expired records.

use crate::config::SessionConfig;
use crate::error::SessionStoreError;
use crate::oauth2::subject::Subject;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};
use tower_sessions::{
    Expiry, Session, SessionManagerLayer, SessionStore,
    cookie::SameSite,
    session::{Error, Id, Record},
    session_store::{self, ExpiredDeletion},
};
use tower_sessions_sqlx_store::{PostgresStore, SqliteStore};

/// CSRF token issued by `GET /`.
pub const AUTH_STATE_KEY: &str = "auth_state";
/// Local part of the email of the last successful login.
pub const USERNAME_KEY: &str = "username";
/// Subject asserted by the last successful login.
pub const SUBJECT_KEY: &str = "subject";

pub const SESSION_COOKIE: &str = "myauth.sid";

/// Build the session layer.
///
/// `SameSite=Lax` keeps the cookie on the top-level redirect back to `/callback`.
pub fn session_layer(
    store: SqlSessionStore,
    config: &SessionConfig,
) -> SessionManagerLayer<SqlSessionStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_secure(config.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            config.inactivity_seconds,
        )))
}

/// Session store sharing the sea-orm connection pool.
#[derive(Clone, Debug)]
pub enum SqlSessionStore {
    Sqlite(SqliteStore),
    Postgres(PostgresStore),
}

impl SqlSessionStore {
    /// Open the store on `db`'s pool and create its table if needed.
    pub async fn connect(db: &DatabaseConnection) -> Result<Self, SessionStoreError> {
        let store = match db.get_database_backend() {
            DatabaseBackend::Sqlite => {
                Self::Sqlite(SqliteStore::new(db.get_sqlite_connection_pool().clone()))
            }
            DatabaseBackend::Postgres => {
                Self::Postgres(PostgresStore::new(db.get_postgres_connection_pool().clone()))
            }
            other => return Err(SessionStoreError::UnsupportedBackend(format!("{other:?}"))),
        };
        match &store {
            Self::Sqlite(inner) => inner.migrate().await?,
            Self::Postgres(inner) => inner.migrate().await?,
        }
        Ok(store)
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        match self {
            Self::Sqlite(inner) => inner.create(record).await,
            Self::Postgres(inner) => inner.create(record).await,
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            Self::Sqlite(inner) => inner.save(record).await,
            Self::Postgres(inner) => inner.save(record).await,
        }
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            Self::Sqlite(inner) => inner.load(id).await,
            Self::Postgres(inner) => inner.load(id).await,
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        match self {
            Self::Sqlite(inner) => inner.delete(id).await,
            Self::Postgres(inner) => inner.delete(id).await,
        }
    }
}

#[async_trait]
impl ExpiredDeletion for SqlSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        match self {
            Self::Sqlite(inner) => inner.delete_expired().await,
            Self::Postgres(inner) => inner.delete_expired().await,
        }
    }
}

pub async fn remember_state(session: &Session, state: &str) -> Result<(), Error> {
    session.insert(AUTH_STATE_KEY, state).await
}

/// Remove and return the stored state; a state value is good for one callback.
pub async fn take_state(session: &Session) -> Result<Option<String>, Error> {
    session.remove::<String>(AUTH_STATE_KEY).await
}

pub async fn remember_username(session: &Session, username: &str) -> Result<(), Error> {
    session.insert(USERNAME_KEY, username).await
}

pub async fn assert_subject(session: &Session, subject: &Subject) -> Result<(), Error> {
    session.insert(SUBJECT_KEY, subject).await
}

pub async fn current_subject(session: &Session) -> Result<Option<Subject>, Error> {
    session.get::<Subject>(SUBJECT_KEY).await
}
