//! Collection rows and the sync token counter.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::dav_collection;
use crate::model::collection::{DavCollection, NewDavCollection};

/// ## Summary
/// Inserts a collection and returns the stored row.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_collection(
    conn: &mut AsyncPgConnection,
    collection: &NewDavCollection,
) -> QueryResult<DavCollection> {
    diesel::insert_into(dav_collection::table)
        .values(collection)
        .returning(DavCollection::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_collection(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<DavCollection>> {
    dav_collection::table
        .find(id)
        .select(DavCollection::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn current_token(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<Option<i64>> {
    dav_collection::table
        .find(id)
        .select(dav_collection::synctoken)
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Atomically advances the collection token by one and returns the new value.
///
/// The row lock taken by the `UPDATE` serializes concurrent writers on the
/// same collection until their transactions finish.
///
/// ## Errors
/// Returns a database error if the update fails.
#[tracing::instrument(skip(conn))]
pub async fn bump_token(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<Option<i64>> {
    diesel::update(dav_collection::table.find(id))
        .set((
            dav_collection::synctoken.eq(dav_collection::synctoken + 1),
            dav_collection::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(dav_collection::synctoken)
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes a collection; instances, members and changes cascade.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_collection(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(dav_collection::table.find(id)).execute(conn).await
}
