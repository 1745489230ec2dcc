//! Address book lifecycle and listing.

use kalends_db::db::enums::{CollectionType, ShareAccess};
use kalends_db::db::store::DavStore;
use kalends_db::model::collection::DavCollection;
use kalends_db::model::instance::DavInstance;

use crate::carddav::property::address_book_changeset;
use crate::dav::property::PropPatch;
use crate::dav::service::collection;
use crate::dav::sync::{ChangeSet, format_token};
use crate::error::ServiceResult;

/// An address book as seen by one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBookInfo {
    pub instance_id: uuid::Uuid,
    pub collection_id: uuid::Uuid,
    pub uri: String,
    pub sync_token: i64,
    pub ctag: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub access: ShareAccess,
}

impl AddressBookInfo {
    #[must_use]
    pub fn new(instance: DavInstance, collection: DavCollection) -> Self {
        Self {
            instance_id: instance.id,
            collection_id: collection.id,
            uri: instance.uri,
            sync_token: collection.synctoken,
            ctag: format_token(collection.synctoken),
            display_name: instance.display_name,
            description: instance.description,
            access: instance.access,
        }
    }
}

/// ## Errors
/// Returns database errors.
pub async fn list_address_books(
    store: &dyn DavStore,
    principal_uri: &str,
) -> ServiceResult<Vec<AddressBookInfo>> {
    let books = store
        .list_instances_for_principal(principal_uri, CollectionType::Addressbook)
        .await?;
    Ok(books
        .into_iter()
        .map(|(instance, collection)| AddressBookInfo::new(instance, collection))
        .collect())
}

/// ## Summary
/// Creates an address book owned by `principal_uri`.
///
/// ## Errors
/// Returns `UnsupportedProperty` for anything but display name and
/// description, and `Conflict` if the uri is taken.
pub async fn create_address_book(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
    properties: &PropPatch,
) -> ServiceResult<AddressBookInfo> {
    let changes = address_book_changeset(properties)?;
    let (collection, instance) = collection::create_collection(
        store,
        principal_uri,
        uri,
        CollectionType::Addressbook,
        Vec::new(),
        &changes,
    )
    .await?;
    Ok(AddressBookInfo::new(instance, collection))
}

/// ## Errors
/// Returns `UnsupportedProperty` without applying anything, and `NotFound`
/// for an unknown instance.
pub async fn update_address_book(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    patch: &PropPatch,
) -> ServiceResult<AddressBookInfo> {
    let changes = address_book_changeset(patch)?;
    let (_, book) = collection::load_instance(store, instance_id, CollectionType::Addressbook).await?;
    let instance = collection::update_instance(store, instance_id, changes).await?;
    Ok(AddressBookInfo::new(instance, book))
}

/// ## Errors
/// Returns `NotFound` for an unknown instance.
pub async fn delete_address_book(store: &dyn DavStore, instance_id: uuid::Uuid) -> ServiceResult<()> {
    collection::delete_instance(store, instance_id, CollectionType::Addressbook).await
}

/// ## Summary
/// Returns the address book's changes since `sync_token`; `None` if unknown.
///
/// ## Errors
/// Returns `InvalidSyncToken` for a malformed token.
pub async fn get_changes_for_address_book(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    sync_token: &str,
    limit: Option<usize>,
) -> ServiceResult<Option<ChangeSet>> {
    collection::get_changes(store, collection_id, CollectionType::Addressbook, sync_token, limit).await
}
