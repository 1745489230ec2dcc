//! Collection instances (owner and sharee views).

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::CollectionType;
use crate::db::schema::{dav_collection, dav_instance};
use crate::model::collection::DavCollection;
use crate::model::instance::{DavInstance, DavInstanceChangeset, NewDavInstance};

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_instance(
    conn: &mut AsyncPgConnection,
    instance: &NewDavInstance,
) -> QueryResult<DavInstance> {
    diesel::insert_into(dav_instance::table)
        .values(instance)
        .returning(DavInstance::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_instance(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> QueryResult<Option<DavInstance>> {
    dav_instance::table
        .find(id)
        .select(DavInstance::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists a principal's instances of the given collection type with their
/// collections, ordered by `calendar_order` then uri.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_principal(
    conn: &mut AsyncPgConnection,
    principal_uri: &str,
    collection_type: CollectionType,
) -> QueryResult<Vec<(DavInstance, DavCollection)>> {
    dav_instance::table
        .inner_join(dav_collection::table)
        .filter(dav_instance::principal_uri.eq(principal_uri))
        .filter(dav_collection::collection_type.eq(collection_type))
        .order((dav_instance::calendar_order.asc(), dav_instance::uri.asc()))
        .select((DavInstance::as_select(), DavCollection::as_select()))
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_collection(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
) -> QueryResult<Vec<DavInstance>> {
    dav_instance::table
        .filter(dav_instance::collection_id.eq(collection_id))
        .order(dav_instance::uri.asc())
        .select(DavInstance::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Applies a changeset and returns the updated row.
///
/// An empty changeset only re-reads the row.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_instance(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &DavInstanceChangeset,
) -> QueryResult<Option<DavInstance>> {
    if changes.is_empty() {
        return get_instance(conn, id).await;
    }
    diesel::update(dav_instance::table.find(id))
        .set(changes)
        .returning(DavInstance::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_instance(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(dav_instance::table.find(id)).execute(conn).await
}
