//! User identity: email normalisation and the find-or-create upsert.

use crate::entity::user;
use crate::error::UserError;
use sea_orm::{
    ConnectionTrait, DbErr, EntityName,
    sea_query::{OnConflict, Query},
};

/// Trim and lowercase an email. Returns `None` unless the result has a
/// non-empty local part and a domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(email),
        _ => None,
    }
}

/// Display name for an email: everything before the first `@`.
pub fn username_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Find or create the user row for `email` and return its id.
///
/// A single `INSERT ... ON CONFLICT (email) DO UPDATE SET email = excluded.email
/// RETURNING id` so the conflict branch still yields the existing row. Concurrent
/// first logins for the same email resolve to one row in the store.
#[tracing::instrument(skip(db))]
pub async fn get_or_create_user<C>(db: &C, email: &str) -> Result<String, UserError>
where
    C: ConnectionTrait,
{
    let candidate_id = uuid::Uuid::new_v4().to_string();
    let mut insert = Query::insert();
    insert
        .into_table(user::Entity.table_ref())
        .columns([user::Column::Id, user::Column::Email])
        .values([candidate_id.into(), email.into()])
        .map_err(|e| DbErr::Custom(e.to_string()))?
        .on_conflict(
            OnConflict::column(user::Column::Email)
                .update_column(user::Column::Email)
                .to_owned(),
        )
        .returning_col(user::Column::Id);

    let statement = db.get_database_backend().build(&insert);
    let Some(row) = db.query_one(statement).await? else {
        return Err(UserError::NotProcessed(email.to_string()));
    };
    let id: String = row.try_get("", "id")?;

    tracing::info!(user_id = %id, email = %email, "Found or created user");
    Ok(id)
}
