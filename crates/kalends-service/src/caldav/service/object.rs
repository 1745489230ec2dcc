//! Calendar object storage and retrieval.
//!
//! Every write denormalizes the payload first; a payload that does not parse
//! never reaches the store.

use kalends_db::db::enums::{CollectionType, ComponentType};
use kalends_db::db::store::DavStore;
use kalends_db::model::object::{DavObject, DavObjectSummary, NewDavObject};

use crate::caldav::denormalize::{DenormalizedFields, denormalize};
use crate::dav::service::collection::require_collection;
use crate::dav::service::object::{
    MemberWrite, delete_member, insert_member, update_member, writable_instance,
};
use crate::error::ServiceResult;

fn calendar_object(
    collection_id: uuid::Uuid,
    uri: &str,
    payload: &[u8],
    fields: DenormalizedFields,
) -> NewDavObject {
    NewDavObject {
        collection_id,
        uri: uri.to_owned(),
        data: payload.to_vec(),
        etag: fields.etag,
        size: fields.size,
        last_modified: chrono::Utc::now(),
        component_type: Some(ComponentType(fields.component_type)),
        first_occurrence: fields.first_occurrence,
        last_occurrence: fields.last_occurrence,
        uid: Some(fields.uid),
    }
}

/// ## Summary
/// Lists object metadata of a calendar.
///
/// ## Errors
/// Returns [`ServiceError::UnknownCollection`] for a missing calendar.
pub async fn list_calendar_objects(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
) -> ServiceResult<Vec<DavObjectSummary>> {
    require_collection(store, collection_id, CollectionType::Calendar).await?;
    Ok(store.list_objects(collection_id).await?)
}

/// ## Summary
/// Fetches one calendar object with its payload.
///
/// ## Errors
/// Returns [`ServiceError::UnknownCollection`] for a missing calendar.
pub async fn get_calendar_object(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    uri: &str,
) -> ServiceResult<Option<DavObject>> {
    require_collection(store, collection_id, CollectionType::Calendar).await?;
    Ok(store.get_object(collection_id, uri).await?)
}

/// ## Summary
/// Fetches the named calendar objects; unknown uris are skipped.
///
/// ## Errors
/// Returns [`ServiceError::UnknownCollection`] for a missing calendar.
pub async fn get_multiple_calendar_objects(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    uris: &[String],
) -> ServiceResult<Vec<DavObject>> {
    require_collection(store, collection_id, CollectionType::Calendar).await?;
    Ok(store.get_objects(collection_id, uris).await?)
}

/// ## Summary
/// Stores a new calendar object.
///
/// ## Side Effects
/// Inserts the object and records an `added` change.
///
/// ## Errors
/// Returns [`ServiceError::MalformedPayload`] for unparseable data,
/// [`ServiceError::Forbidden`] through a read-only instance and
/// [`ServiceError::Conflict`] if the uri exists.
#[tracing::instrument(skip(store, payload), fields(size = payload.len()))]
pub async fn create_calendar_object(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    uri: &str,
    payload: &[u8],
) -> ServiceResult<MemberWrite> {
    let fields = denormalize(payload)?;
    let (_, calendar) = writable_instance(store, instance_id, CollectionType::Calendar).await?;
    insert_member(store, calendar_object(calendar.id, uri, payload, fields)).await
}

/// ## Summary
/// Replaces an existing calendar object.
///
/// ## Side Effects
/// Rewrites the object with fresh derived fields and records a `modified` change.
///
/// ## Errors
/// Returns [`ServiceError::MalformedPayload`] for unparseable data,
/// [`ServiceError::Forbidden`] through a read-only instance and
/// [`ServiceError::NotFound`] if the uri does not exist.
#[tracing::instrument(skip(store, payload), fields(size = payload.len()))]
pub async fn update_calendar_object(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    uri: &str,
    payload: &[u8],
) -> ServiceResult<MemberWrite> {
    let fields = denormalize(payload)?;
    let (_, calendar) = writable_instance(store, instance_id, CollectionType::Calendar).await?;
    update_member(store, calendar_object(calendar.id, uri, payload, fields)).await
}

/// ## Summary
/// Deletes a calendar object.
///
/// ## Side Effects
/// Removes the object and records a `deleted` change.
///
/// ## Errors
/// Returns [`ServiceError::Forbidden`] through a read-only instance and
/// [`ServiceError::NotFound`] if the uri does not exist.
#[tracing::instrument(skip(store))]
pub async fn delete_calendar_object(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    uri: &str,
) -> ServiceResult<MemberWrite> {
    let (_, calendar) = writable_instance(store, instance_id, CollectionType::Calendar).await?;
    delete_member(store, calendar.id, uri).await
}

/// ## Summary
/// Locates an object by UID among the calendars a principal owns.
///
/// Returns `"<calendar uri>/<object uri>"`.
///
/// ## Errors
/// Returns database errors.
pub async fn get_calendar_object_by_uid(
    store: &dyn DavStore,
    principal_uri: &str,
    uid: &str,
) -> ServiceResult<Option<String>> {
    Ok(store
        .find_object_by_uid(principal_uri, uid)
        .await?
        .map(|(calendar_uri, object_uri)| format!("{calendar_uri}/{object_uri}")))
}
