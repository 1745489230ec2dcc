//! Member objects and the index pushdown.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::ShareAccess;
use crate::db::schema::{dav_instance, dav_object};
use crate::db::store::{IndexPredicate, QueryCandidate};
use crate::model::object::{DavObject, DavObjectSummary, NewDavObject};

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_summaries(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
) -> QueryResult<Vec<DavObjectSummary>> {
    dav_object::table
        .filter(dav_object::collection_id.eq(collection_id))
        .order(dav_object::uri.asc())
        .select(DavObjectSummary::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn member_uris(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
) -> QueryResult<Vec<String>> {
    dav_object::table
        .filter(dav_object::collection_id.eq(collection_id))
        .order(dav_object::uri.asc())
        .select(dav_object::uri)
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_object(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
    uri: &str,
) -> QueryResult<Option<DavObject>> {
    dav_object::table
        .filter(dav_object::collection_id.eq(collection_id))
        .filter(dav_object::uri.eq(uri))
        .select(DavObject::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_objects(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
    uris: &[String],
) -> QueryResult<Vec<DavObject>> {
    dav_object::table
        .filter(dav_object::collection_id.eq(collection_id))
        .filter(dav_object::uri.eq_any(uris))
        .order(dav_object::uri.asc())
        .select(DavObject::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the insert fails, including a unique
/// violation when the uri is already taken.
#[tracing::instrument(skip(conn, object), fields(collection_id = %object.collection_id, uri = %object.uri))]
pub async fn insert_object(conn: &mut AsyncPgConnection, object: &NewDavObject) -> QueryResult<usize> {
    diesel::insert_into(dav_object::table)
        .values(object)
        .execute(conn)
        .await
}

/// ## Summary
/// Replaces the payload and every derived column of an existing member.
///
/// ## Errors
/// Returns a database error if the update fails.
#[tracing::instrument(skip(conn, object), fields(collection_id = %object.collection_id, uri = %object.uri))]
pub async fn replace_object(conn: &mut AsyncPgConnection, object: &NewDavObject) -> QueryResult<usize> {
    diesel::update(
        dav_object::table
            .filter(dav_object::collection_id.eq(object.collection_id))
            .filter(dav_object::uri.eq(&object.uri)),
    )
    .set(object)
    .execute(conn)
    .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_object(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
    uri: &str,
) -> QueryResult<usize> {
    diesel::delete(
        dav_object::table
            .filter(dav_object::collection_id.eq(collection_id))
            .filter(dav_object::uri.eq(uri)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Finds `(instance uri, object uri)` for a UID within collections the
/// principal owns.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_by_uid(
    conn: &mut AsyncPgConnection,
    principal_uri: &str,
    uid: &str,
) -> QueryResult<Option<(String, String)>> {
    dav_object::table
        .inner_join(dav_instance::table.on(dav_instance::collection_id.eq(dav_object::collection_id)))
        .filter(dav_instance::principal_uri.eq(principal_uri))
        .filter(dav_instance::access.eq(ShareAccess::Owner))
        .filter(dav_object::uid.eq(uid))
        .order((dav_instance::uri.asc(), dav_object::uri.asc()))
        .select((dav_instance::uri, dav_object::uri))
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Runs the pushed-down part of a calendar query.
///
/// Rows with `NULL` occurrence columns never satisfy an occurrence bound.
///
/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn query_candidates(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
    predicate: &IndexPredicate,
    with_data: bool,
) -> QueryResult<Vec<QueryCandidate>> {
    let mut query = dav_object::table
        .filter(dav_object::collection_id.eq(collection_id))
        .order(dav_object::uri.asc())
        .into_boxed();

    if let Some(component_type) = predicate.component_type {
        query = query.filter(dav_object::component_type.eq(component_type));
    }
    if let Some(after) = predicate.occurs_after {
        query = query.filter(dav_object::last_occurrence.ge(after));
    }
    if let Some(before) = predicate.occurs_before {
        query = query.filter(dav_object::first_occurrence.le(before));
    }

    if with_data {
        let rows: Vec<(String, Vec<u8>)> = query
            .select((dav_object::uri, dav_object::data))
            .load(conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(uri, data)| QueryCandidate { uri, data: Some(data) })
            .collect())
    } else {
        let uris: Vec<String> = query.select(dav_object::uri).load(conn).await?;
        Ok(uris
            .into_iter()
            .map(|uri| QueryCandidate { uri, data: None })
            .collect())
    }
}
