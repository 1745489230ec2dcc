//! Collection lifecycle shared by calendars and address books.

use kalends_core::constants::INITIAL_SYNC_TOKEN;
use kalends_db::db::enums::{CollectionType, ShareAccess};
use kalends_db::db::store::DavStore;
use kalends_db::model::collection::{DavCollection, NewDavCollection};
use kalends_db::model::instance::{DavInstance, DavInstanceChangeset, NewDavInstance};

use crate::dav::sync::{self, ChangeSet, SyncToken};
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Loads an instance together with its collection, checking the type.
///
/// ## Errors
/// Returns [`ServiceError::NotFound`] if the instance is missing or belongs
/// to a collection of another type.
pub async fn load_instance(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    collection_type: CollectionType,
) -> ServiceResult<(DavInstance, DavCollection)> {
    let not_found = || ServiceError::NotFound(format!("{collection_type} instance {instance_id}"));

    let instance = store.get_instance(instance_id).await?.ok_or_else(not_found)?;
    let collection = store
        .get_collection(instance.collection_id)
        .await?
        .filter(|collection| collection.collection_type == collection_type)
        .ok_or_else(not_found)?;
    Ok((instance, collection))
}

/// ## Summary
/// Loads a collection, checking the type.
///
/// ## Errors
/// Returns [`ServiceError::UnknownCollection`] if it does not exist or has
/// another type.
pub async fn require_collection(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    collection_type: CollectionType,
) -> ServiceResult<DavCollection> {
    store
        .get_collection(collection_id)
        .await?
        .filter(|collection| collection.collection_type == collection_type)
        .ok_or(ServiceError::UnknownCollection(collection_id))
}

/// ## Summary
/// Creates a collection at token 1 with an owner instance for `principal_uri`.
///
/// ## Side Effects
/// Inserts the collection and its owner instance.
///
/// ## Errors
/// Returns [`ServiceError::Conflict`] if the principal already has a
/// collection at `uri`.
#[tracing::instrument(skip(store, properties), fields(%collection_type))]
pub async fn create_collection(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
    collection_type: CollectionType,
    supported_components: Vec<String>,
    properties: &DavInstanceChangeset,
) -> ServiceResult<(DavCollection, DavInstance)> {
    let collection_id = uuid::Uuid::new_v4();
    let mut owner = NewDavInstance::owner(collection_id, principal_uri, uri);
    let mut preview = owner.clone().into_instance();
    properties.apply_to(&mut preview);
    owner.display_name = preview.display_name;
    owner.description = preview.description;
    owner.timezone = preview.timezone;
    owner.calendar_order = preview.calendar_order;
    owner.calendar_color = preview.calendar_color;
    owner.transparent = preview.transparent;

    let created = store
        .create_collection(
            NewDavCollection {
                id: collection_id,
                collection_type,
                supported_components,
            },
            owner,
        )
        .await
        .map_err(|err| {
            if err.is_unique_violation() {
                ServiceError::Conflict(format!("{principal_uri}/{uri} already exists"))
            } else {
                err.into()
            }
        })?;

    debug_assert_eq!(created.0.synctoken, INITIAL_SYNC_TOKEN);
    tracing::info!(%collection_id, "Created collection");
    Ok(created)
}

/// ## Summary
/// Applies a changeset to an instance and returns the updated row.
///
/// ## Errors
/// Returns [`ServiceError::NotFound`] if the instance disappeared.
pub async fn update_instance(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    changes: DavInstanceChangeset,
) -> ServiceResult<DavInstance> {
    store
        .update_instance(instance_id, changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("instance {instance_id}")))
}

/// ## Summary
/// Deletes a collection instance.
///
/// ## Side Effects
/// For the owner instance the whole collection goes, with every member,
/// change record and sharee instance. Otherwise only this instance goes.
///
/// ## Errors
/// Returns [`ServiceError::NotFound`] if the instance does not exist.
#[tracing::instrument(skip(store))]
pub async fn delete_instance(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    collection_type: CollectionType,
) -> ServiceResult<()> {
    let (instance, collection) = load_instance(store, instance_id, collection_type).await?;

    if instance.access == ShareAccess::Owner {
        store.delete_collection(collection.id).await?;
        tracing::info!(collection_id = %collection.id, "Deleted collection");
    } else {
        store.delete_instance(instance.id).await?;
        tracing::info!("Deleted shared instance");
    }
    Ok(())
}

/// ## Summary
/// Parses `token` and returns the collection's changes since it.
///
/// `None` means the collection is unknown (or of another type) and the
/// client has to resynchronize from scratch.
///
/// ## Errors
/// Returns [`ServiceError::InvalidSyncToken`] if `token` is malformed.
pub async fn get_changes(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    collection_type: CollectionType,
    token: &str,
    limit: Option<usize>,
) -> ServiceResult<Option<ChangeSet>> {
    let token: SyncToken = token.parse()?;
    match store.get_collection(collection_id).await? {
        Some(collection) if collection.collection_type == collection_type => {
            sync::get_changes(store, collection_id, token, limit).await
        }
        _ => Ok(None),
    }
}
