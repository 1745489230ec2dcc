//! Scheduling inbox objects.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::dav_scheduling_object;
use crate::model::scheduling::{DavSchedulingObject, NewDavSchedulingObject};

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_scheduling_object(
    conn: &mut AsyncPgConnection,
    object: &NewDavSchedulingObject,
) -> QueryResult<DavSchedulingObject> {
    diesel::insert_into(dav_scheduling_object::table)
        .values(object)
        .returning(DavSchedulingObject::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_scheduling_object(
    conn: &mut AsyncPgConnection,
    principal_uri: &str,
    uri: &str,
) -> QueryResult<Option<DavSchedulingObject>> {
    dav_scheduling_object::table
        .filter(dav_scheduling_object::principal_uri.eq(principal_uri))
        .filter(dav_scheduling_object::uri.eq(uri))
        .select(DavSchedulingObject::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_scheduling_objects(
    conn: &mut AsyncPgConnection,
    principal_uri: &str,
) -> QueryResult<Vec<DavSchedulingObject>> {
    dav_scheduling_object::table
        .filter(dav_scheduling_object::principal_uri.eq(principal_uri))
        .order(dav_scheduling_object::uri.asc())
        .select(DavSchedulingObject::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_scheduling_object(
    conn: &mut AsyncPgConnection,
    principal_uri: &str,
    uri: &str,
) -> QueryResult<usize> {
    diesel::delete(
        dav_scheduling_object::table
            .filter(dav_scheduling_object::principal_uri.eq(principal_uri))
            .filter(dav_scheduling_object::uri.eq(uri)),
    )
    .execute(conn)
    .await
}
