//! Card storage. Cards are stored opaquely: no parsing, only etag and size.

use kalends_db::db::enums::CollectionType;
use kalends_db::db::store::DavStore;
use kalends_db::model::object::{DavObject, DavObjectSummary, NewDavObject};

use crate::dav::etag::{generate_etag, payload_size};
use crate::dav::service::collection::require_collection;
use crate::dav::service::object::{
    MemberWrite, delete_member, insert_member, update_member, writable_instance,
};
use crate::error::ServiceResult;

fn card(collection_id: uuid::Uuid, uri: &str, payload: &[u8]) -> NewDavObject {
    NewDavObject {
        collection_id,
        uri: uri.to_owned(),
        data: payload.to_vec(),
        etag: generate_etag(payload),
        size: payload_size(payload),
        last_modified: chrono::Utc::now(),
        component_type: None,
        first_occurrence: None,
        last_occurrence: None,
        uid: None,
    }
}

/// ## Errors
/// Returns `UnknownCollection` for a missing address book.
pub async fn list_cards(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
) -> ServiceResult<Vec<DavObjectSummary>> {
    require_collection(store, collection_id, CollectionType::Addressbook).await?;
    Ok(store.list_objects(collection_id).await?)
}

/// ## Errors
/// Returns `UnknownCollection` for a missing address book.
pub async fn get_card(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    uri: &str,
) -> ServiceResult<Option<DavObject>> {
    require_collection(store, collection_id, CollectionType::Addressbook).await?;
    Ok(store.get_object(collection_id, uri).await?)
}

/// Unknown uris are skipped.
///
/// ## Errors
/// Returns `UnknownCollection` for a missing address book.
pub async fn get_multiple_cards(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    uris: &[String],
) -> ServiceResult<Vec<DavObject>> {
    require_collection(store, collection_id, CollectionType::Addressbook).await?;
    Ok(store.get_objects(collection_id, uris).await?)
}

/// ## Summary
/// Stores a new card and records an `added` change.
///
/// ## Errors
/// Returns `Forbidden` through a read-only instance and `Conflict` if the
/// uri exists.
#[tracing::instrument(skip(store, payload), fields(size = payload.len()))]
pub async fn create_card(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    uri: &str,
    payload: &[u8],
) -> ServiceResult<MemberWrite> {
    let (_, book) = writable_instance(store, instance_id, CollectionType::Addressbook).await?;
    insert_member(store, card(book.id, uri, payload)).await
}

/// ## Summary
/// Replaces a card and records a `modified` change.
///
/// ## Errors
/// Returns `Forbidden` through a read-only instance and `NotFound` if the
/// uri does not exist.
#[tracing::instrument(skip(store, payload), fields(size = payload.len()))]
pub async fn update_card(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    uri: &str,
    payload: &[u8],
) -> ServiceResult<MemberWrite> {
    let (_, book) = writable_instance(store, instance_id, CollectionType::Addressbook).await?;
    update_member(store, card(book.id, uri, payload)).await
}

/// ## Errors
/// Returns `Forbidden` through a read-only instance and `NotFound` if the
/// uri does not exist.
#[tracing::instrument(skip(store))]
pub async fn delete_card(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    uri: &str,
) -> ServiceResult<MemberWrite> {
    let (_, book) = writable_instance(store, instance_id, CollectionType::Addressbook).await?;
    delete_member(store, book.id, uri).await
}
