//! Calendar subscriptions.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::dav_subscription;
use crate::model::subscription::{DavSubscription, DavSubscriptionChangeset, NewDavSubscription};

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_principal(
    conn: &mut AsyncPgConnection,
    principal_uri: &str,
) -> QueryResult<Vec<DavSubscription>> {
    dav_subscription::table
        .filter(dav_subscription::principal_uri.eq(principal_uri))
        .order((dav_subscription::calendar_order.asc(), dav_subscription::uri.asc()))
        .select(DavSubscription::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_subscription(
    conn: &mut AsyncPgConnection,
    subscription: &NewDavSubscription,
) -> QueryResult<DavSubscription> {
    diesel::insert_into(dav_subscription::table)
        .values(subscription)
        .returning(DavSubscription::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn update_subscription(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &DavSubscriptionChangeset,
) -> QueryResult<Option<DavSubscription>> {
    diesel::update(dav_subscription::table.find(id))
        .set(changes)
        .returning(DavSubscription::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_subscription(conn: &mut AsyncPgConnection, id: uuid::Uuid) -> QueryResult<usize> {
    diesel::delete(dav_subscription::table.find(id))
        .execute(conn)
        .await
}
