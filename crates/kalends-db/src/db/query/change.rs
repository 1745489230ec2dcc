//! Change log rows.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::dav_change;
use crate::model::change::{DavChange, NewDavChange};

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_change(conn: &mut AsyncPgConnection, change: &NewDavChange) -> QueryResult<usize> {
    diesel::insert_into(dav_change::table)
        .values(change)
        .execute(conn)
        .await
}

/// ## Summary
/// Change records with `from <= synctoken < until`, ascending by token.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn changes_between(
    conn: &mut AsyncPgConnection,
    collection_id: uuid::Uuid,
    from: i64,
    until: i64,
) -> QueryResult<Vec<DavChange>> {
    dav_change::table
        .filter(dav_change::collection_id.eq(collection_id))
        .filter(dav_change::synctoken.ge(from))
        .filter(dav_change::synctoken.lt(until))
        .order(dav_change::synctoken.asc())
        .select(DavChange::as_select())
        .load(conn)
        .await
}
