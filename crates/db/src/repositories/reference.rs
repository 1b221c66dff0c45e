//! Per-tenant reference id allocation.

use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, FromQueryResult, SqlErr, Statement,
};
use uuid::Uuid;

use staffdesk_core::reference::next_reference;

use crate::repositories::error::RepoError;

#[derive(Debug, FromQueryResult)]
struct LatestReference {
    reference_id: String,
}

/// Allocates the next reference id with `prefix` in `table`.
///
/// `table` must be one of the tenant-scoped tables with a `reference_id`
/// column. Concurrent allocations collide on the unique index and surface
/// as a conflict from [`insert_conflict`].
pub(crate) async fn next_reference_id<C: ConnectionTrait>(
    conn: &C,
    table: &'static str,
    tenant_id: Uuid,
    prefix: &str,
) -> Result<String, DbErr> {
    let sql = format!(
        "SELECT reference_id FROM {table} \
         WHERE tenant_id = $1 AND reference_id LIKE $2 \
         ORDER BY char_length(reference_id) DESC, reference_id DESC \
         LIMIT 1"
    );
    let latest = LatestReference::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        [tenant_id.into(), format!("{prefix}-%").into()],
    ))
    .one(conn)
    .await?;

    Ok(next_reference(
        prefix,
        latest.as_ref().map(|r| r.reference_id.as_str()),
    ))
}

/// Maps a unique-constraint violation on insert to a conflict.
pub(crate) fn insert_conflict(err: DbErr, message: &str) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepoError::Conflict(message.to_string()),
        _ => RepoError::Database(err),
    }
}
