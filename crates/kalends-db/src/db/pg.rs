//! PostgreSQL implementation of [`DavStore`].

use diesel_async::AsyncPgConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use futures::FutureExt;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::db::enums::{ChangeOperation, CollectionType};
use crate::db::query;
use crate::db::store::{DavStore, IndexPredicate, QueryCandidate};
use crate::db::transaction::with_transaction;
use crate::error::DbResult;
use crate::model::change::{DavChange, NewDavChange};
use crate::model::collection::{DavCollection, NewDavCollection};
use crate::model::instance::{DavInstance, DavInstanceChangeset, NewDavInstance};
use crate::model::object::{DavObject, DavObjectSummary, NewDavObject};
use crate::model::scheduling::{DavSchedulingObject, NewDavSchedulingObject};
use crate::model::subscription::{DavSubscription, DavSubscriptionChangeset, NewDavSubscription};

/// Store backed by a `bb8` pool of async Postgres connections.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// ## Summary
/// Advances the collection token and records the change at the previous one.
///
/// Must run inside the transaction that wrote the member row.
///
/// ## Errors
/// Returns `NotFound` if the collection vanished, or any database error.
#[tracing::instrument(skip(tx))]
async fn append_change(
    tx: &mut AsyncPgConnection,
    collection_id: Uuid,
    uri: &str,
    operation: ChangeOperation,
) -> DbResult<i64> {
    let next = query::collection::bump_token(tx, collection_id)
        .await?
        .ok_or(diesel::result::Error::NotFound)?;
    let token = next - 1;
    query::change::insert_change(
        tx,
        &NewDavChange {
            collection_id,
            uri: uri.to_owned(),
            synctoken: token,
            operation,
        },
    )
    .await?;
    tracing::debug!(token, "Recorded change");
    Ok(token)
}

impl DavStore for PgStore {
    fn create_collection(
        &self,
        collection: NewDavCollection,
        owner: NewDavInstance,
    ) -> BoxFuture<'_, DbResult<(DavCollection, DavInstance)>> {
        async move {
            let mut conn = self.pool.get().await?;
            with_transaction(&mut conn, |tx| {
                async move {
                    let collection = query::collection::insert_collection(tx, &collection).await?;
                    let instance = query::instance::insert_instance(tx, &owner).await?;
                    Ok((collection, instance))
                }
                .scope_boxed()
            })
            .await
        }
        .boxed()
    }

    fn get_collection(&self, id: Uuid) -> BoxFuture<'_, DbResult<Option<DavCollection>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::collection::get_collection(&mut conn, id).await?)
        }
        .boxed()
    }

    fn get_instance(&self, id: Uuid) -> BoxFuture<'_, DbResult<Option<DavInstance>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::instance::get_instance(&mut conn, id).await?)
        }
        .boxed()
    }

    fn list_instances_for_principal<'a>(
        &'a self,
        principal_uri: &'a str,
        collection_type: CollectionType,
    ) -> BoxFuture<'a, DbResult<Vec<(DavInstance, DavCollection)>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::instance::list_for_principal(&mut conn, principal_uri, collection_type).await?)
        }
        .boxed()
    }

    fn list_instances_for_collection(
        &self,
        collection_id: Uuid,
    ) -> BoxFuture<'_, DbResult<Vec<DavInstance>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::instance::list_for_collection(&mut conn, collection_id).await?)
        }
        .boxed()
    }

    fn insert_instance(&self, instance: NewDavInstance) -> BoxFuture<'_, DbResult<DavInstance>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::instance::insert_instance(&mut conn, &instance).await?)
        }
        .boxed()
    }

    fn update_instance(
        &self,
        id: Uuid,
        changes: DavInstanceChangeset,
    ) -> BoxFuture<'_, DbResult<Option<DavInstance>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::instance::update_instance(&mut conn, id, &changes).await?)
        }
        .boxed()
    }

    fn delete_instance(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::instance::delete_instance(&mut conn, id).await? > 0)
        }
        .boxed()
    }

    fn delete_collection(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::collection::delete_collection(&mut conn, id).await? > 0)
        }
        .boxed()
    }

    fn list_objects(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Vec<DavObjectSummary>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::object::list_summaries(&mut conn, collection_id).await?)
        }
        .boxed()
    }

    fn get_object<'a>(
        &'a self,
        collection_id: Uuid,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<DavObject>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::object::get_object(&mut conn, collection_id, uri).await?)
        }
        .boxed()
    }

    fn get_objects<'a>(
        &'a self,
        collection_id: Uuid,
        uris: &'a [String],
    ) -> BoxFuture<'a, DbResult<Vec<DavObject>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::object::get_objects(&mut conn, collection_id, uris).await?)
        }
        .boxed()
    }

    fn insert_object(&self, object: NewDavObject) -> BoxFuture<'_, DbResult<i64>> {
        async move {
            let mut conn = self.pool.get().await?;
            with_transaction(&mut conn, |tx| {
                async move {
                    query::object::insert_object(tx, &object).await?;
                    append_change(tx, object.collection_id, &object.uri, ChangeOperation::Added).await
                }
                .scope_boxed()
            })
            .await
        }
        .boxed()
    }

    fn update_object(&self, object: NewDavObject) -> BoxFuture<'_, DbResult<Option<i64>>> {
        async move {
            let mut conn = self.pool.get().await?;
            with_transaction(&mut conn, |tx| {
                async move {
                    if query::object::replace_object(tx, &object).await? == 0 {
                        return Ok(None);
                    }
                    let token =
                        append_change(tx, object.collection_id, &object.uri, ChangeOperation::Modified)
                            .await?;
                    Ok(Some(token))
                }
                .scope_boxed()
            })
            .await
        }
        .boxed()
    }

    fn delete_object<'a>(
        &'a self,
        collection_id: Uuid,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<i64>>> {
        async move {
            let mut conn = self.pool.get().await?;
            with_transaction(&mut conn, |tx| {
                async move {
                    if query::object::delete_object(tx, collection_id, uri).await? == 0 {
                        return Ok(None);
                    }
                    let token = append_change(tx, collection_id, uri, ChangeOperation::Deleted).await?;
                    Ok(Some(token))
                }
                .scope_boxed()
            })
            .await
        }
        .boxed()
    }

    fn find_object_by_uid<'a>(
        &'a self,
        principal_uri: &'a str,
        uid: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<(String, String)>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::object::find_by_uid(&mut conn, principal_uri, uid).await?)
        }
        .boxed()
    }

    fn query_objects<'a>(
        &'a self,
        collection_id: Uuid,
        predicate: &'a IndexPredicate,
        with_data: bool,
    ) -> BoxFuture<'a, DbResult<Vec<QueryCandidate>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::object::query_candidates(&mut conn, collection_id, predicate, with_data).await?)
        }
        .boxed()
    }

    fn current_token(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Option<i64>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::collection::current_token(&mut conn, collection_id).await?)
        }
        .boxed()
    }

    fn member_uris(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Vec<String>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::object::member_uris(&mut conn, collection_id).await?)
        }
        .boxed()
    }

    fn changes_between(
        &self,
        collection_id: Uuid,
        from: i64,
        until: i64,
    ) -> BoxFuture<'_, DbResult<Vec<DavChange>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::change::changes_between(&mut conn, collection_id, from, until).await?)
        }
        .boxed()
    }

    fn list_subscriptions<'a>(
        &'a self,
        principal_uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Vec<DavSubscription>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::subscription::list_for_principal(&mut conn, principal_uri).await?)
        }
        .boxed()
    }

    fn insert_subscription(
        &self,
        subscription: NewDavSubscription,
    ) -> BoxFuture<'_, DbResult<DavSubscription>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::subscription::insert_subscription(&mut conn, &subscription).await?)
        }
        .boxed()
    }

    fn update_subscription(
        &self,
        id: Uuid,
        changes: DavSubscriptionChangeset,
    ) -> BoxFuture<'_, DbResult<Option<DavSubscription>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::subscription::update_subscription(&mut conn, id, &changes).await?)
        }
        .boxed()
    }

    fn delete_subscription(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::subscription::delete_subscription(&mut conn, id).await? > 0)
        }
        .boxed()
    }

    fn insert_scheduling_object(
        &self,
        object: NewDavSchedulingObject,
    ) -> BoxFuture<'_, DbResult<DavSchedulingObject>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::scheduling::insert_scheduling_object(&mut conn, &object).await?)
        }
        .boxed()
    }

    fn get_scheduling_object<'a>(
        &'a self,
        principal_uri: &'a str,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<DavSchedulingObject>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::scheduling::get_scheduling_object(&mut conn, principal_uri, uri).await?)
        }
        .boxed()
    }

    fn list_scheduling_objects<'a>(
        &'a self,
        principal_uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Vec<DavSchedulingObject>>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::scheduling::list_scheduling_objects(&mut conn, principal_uri).await?)
        }
        .boxed()
    }

    fn delete_scheduling_object<'a>(
        &'a self,
        principal_uri: &'a str,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<bool>> {
        async move {
            let mut conn = self.pool.get().await?;
            Ok(query::scheduling::delete_scheduling_object(&mut conn, principal_uri, uri).await? > 0)
        }
        .boxed()
    }
}
