//! Member writes shared by calendar objects and cards.
//!
//! Each write lands in the store together with its change record. A token
//! conflict reported by the store is retried a bounded number of times.

use futures::future::BoxFuture;

use kalends_db::db::enums::CollectionType;
use kalends_db::db::store::DavStore;
use kalends_db::error::DbResult;
use kalends_db::model::collection::DavCollection;
use kalends_db::model::instance::DavInstance;
use kalends_db::model::object::NewDavObject;

use super::collection::load_instance;
use crate::error::{ServiceError, ServiceResult};

/// Attempts made before a token conflict is surfaced.
pub const MAX_TOKEN_RETRIES: usize = 3;

/// Outcome of a member write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberWrite {
    /// `ETag` of the stored payload; empty for deletes.
    pub etag: String,
    /// Token the change was recorded at.
    pub token: i64,
}

/// ## Summary
/// Resolves an instance that may modify members.
///
/// ## Errors
/// Returns [`ServiceError::NotFound`] for an unknown instance and
/// [`ServiceError::Forbidden`] for a read-only one.
pub async fn writable_instance(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    collection_type: CollectionType,
) -> ServiceResult<(DavInstance, DavCollection)> {
    let (instance, collection) = load_instance(store, instance_id, collection_type).await?;
    if !instance.access.can_write() {
        tracing::warn!(%instance_id, access = ?instance.access, "Write through read-only instance");
        return Err(ServiceError::Forbidden(format!(
            "instance {instance_id} is read-only"
        )));
    }
    Ok((instance, collection))
}

/// ## Summary
/// Runs a store write, retrying while it reports a token conflict.
///
/// ## Errors
/// Returns [`ServiceError::ConcurrentTokenConflict`] once the retries are
/// exhausted, or the first non-conflict error.
pub async fn retry_token_conflicts<'a, T, F>(collection_id: uuid::Uuid, mut write: F) -> ServiceResult<T>
where
    F: FnMut() -> BoxFuture<'a, DbResult<T>>,
{
    for attempt in 1..=MAX_TOKEN_RETRIES {
        match write().await {
            Err(err) if err.is_token_conflict() => {
                tracing::warn!(%collection_id, attempt, error = %err, "Sync token conflict, retrying");
            }
            result => return result.map_err(ServiceError::from),
        }
    }
    Err(ServiceError::ConcurrentTokenConflict(collection_id))
}

/// ## Errors
/// Returns [`ServiceError::Conflict`] if the uri is taken.
pub async fn insert_member(store: &dyn DavStore, object: NewDavObject) -> ServiceResult<MemberWrite> {
    let collection_id = object.collection_id;
    let etag = object.etag.clone();
    let uri = object.uri.clone();
    let token = retry_token_conflicts(collection_id, || store.insert_object(object.clone()))
        .await
        .map_err(|err| match err {
            ServiceError::DatabaseError(db) if db.is_unique_violation() => {
                ServiceError::Conflict(format!("{uri} already exists"))
            }
            other => other,
        })?;
    tracing::debug!(%collection_id, uri = %uri, token, "Member added");
    Ok(MemberWrite { etag, token })
}

/// ## Errors
/// Returns [`ServiceError::NotFound`] if the member does not exist.
pub async fn update_member(store: &dyn DavStore, object: NewDavObject) -> ServiceResult<MemberWrite> {
    let collection_id = object.collection_id;
    let etag = object.etag.clone();
    let uri = object.uri.clone();
    let token = retry_token_conflicts(collection_id, || store.update_object(object.clone()))
        .await?
        .ok_or_else(|| ServiceError::NotFound(uri.clone()))?;
    tracing::debug!(%collection_id, uri = %uri, token, "Member modified");
    Ok(MemberWrite { etag, token })
}

/// ## Errors
/// Returns [`ServiceError::NotFound`] if the member does not exist.
pub async fn delete_member(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    uri: &str,
) -> ServiceResult<MemberWrite> {
    let token = retry_token_conflicts(collection_id, || store.delete_object(collection_id, uri))
        .await?
        .ok_or_else(|| ServiceError::NotFound(uri.to_owned()))?;
    tracing::debug!(%collection_id, uri, token, "Member deleted");
    Ok(MemberWrite {
        etag: String::new(),
        token,
    })
}
