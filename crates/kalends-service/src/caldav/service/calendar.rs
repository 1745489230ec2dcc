//! Calendar lifecycle and listing.

use kalends_core::constants::DEFAULT_CALENDAR_COMPONENTS;
use kalends_core::types::ComponentType;
use kalends_db::db::enums::{CollectionType, ShareAccess};
use kalends_db::db::store::DavStore;
use kalends_db::model::collection::DavCollection;
use kalends_db::model::instance::DavInstance;

use crate::caldav::property::calendar_changeset;
use crate::dav::property::PropPatch;
use crate::dav::service::collection;
use crate::dav::sync::{ChangeSet, format_token};
use crate::error::{ServiceError, ServiceResult};

/// A calendar as seen by one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub instance_id: uuid::Uuid,
    pub collection_id: uuid::Uuid,
    pub principal_uri: Option<String>,
    pub uri: String,
    pub sync_token: i64,
    /// `getctag` value.
    pub ctag: String,
    pub supported_components: Vec<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub order: i32,
    pub color: Option<String>,
    pub transparent: bool,
    pub access: ShareAccess,
    pub read_only: bool,
    pub share_href: Option<String>,
}

impl CalendarInfo {
    #[must_use]
    pub fn new(instance: DavInstance, collection: DavCollection) -> Self {
        Self {
            instance_id: instance.id,
            collection_id: collection.id,
            principal_uri: instance.principal_uri,
            uri: instance.uri,
            sync_token: collection.synctoken,
            ctag: format_token(collection.synctoken),
            supported_components: collection.supported_components,
            display_name: instance.display_name,
            description: instance.description,
            timezone: instance.timezone,
            order: instance.calendar_order,
            color: instance.calendar_color,
            transparent: instance.transparent,
            read_only: instance.access == ShareAccess::Read,
            access: instance.access,
            share_href: instance.share_href,
        }
    }
}

/// Creation parameters of a calendar.
#[derive(Debug, Clone, Default)]
pub struct NewCalendarProps {
    /// `None` selects VEVENT and VTODO.
    pub supported_components: Option<Vec<ComponentType>>,
    pub properties: PropPatch,
}

/// ## Summary
/// Lists the calendars visible to a principal, owned and shared.
///
/// ## Errors
/// Returns database errors.
pub async fn list_calendars(
    store: &dyn DavStore,
    principal_uri: &str,
) -> ServiceResult<Vec<CalendarInfo>> {
    let calendars = store
        .list_instances_for_principal(principal_uri, CollectionType::Calendar)
        .await?;
    Ok(calendars
        .into_iter()
        .map(|(instance, collection)| CalendarInfo::new(instance, collection))
        .collect())
}

/// ## Summary
/// Creates a calendar owned by `principal_uri`.
///
/// ## Side Effects
/// Inserts the collection at token 1 and the owner instance.
///
/// ## Errors
/// Returns [`ServiceError::ValidationError`] for an empty component set,
/// property mapping errors for a bad `properties` patch, and
/// [`ServiceError::Conflict`] if the uri is taken.
pub async fn create_calendar(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
    props: NewCalendarProps,
) -> ServiceResult<CalendarInfo> {
    let supported_components: Vec<String> = match props.supported_components {
        Some(components) if components.is_empty() => {
            return Err(ServiceError::ValidationError(
                "a calendar must support at least one component".to_owned(),
            ));
        }
        Some(components) => components.iter().map(|c| c.as_str().to_owned()).collect(),
        None => DEFAULT_CALENDAR_COMPONENTS.iter().map(|&c| c.to_owned()).collect(),
    };
    let properties = calendar_changeset(&props.properties)?;

    let (collection, instance) = collection::create_collection(
        store,
        principal_uri,
        uri,
        CollectionType::Calendar,
        supported_components,
        &properties,
    )
    .await?;
    Ok(CalendarInfo::new(instance, collection))
}

/// ## Summary
/// Applies a property patch to a calendar instance.
///
/// ## Errors
/// Returns [`ServiceError::UnsupportedProperty`] or
/// [`ServiceError::InvalidPropertyValue`] without applying anything, and
/// [`ServiceError::NotFound`] for an unknown instance.
#[tracing::instrument(skip(store, patch))]
pub async fn update_calendar(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    patch: &PropPatch,
) -> ServiceResult<CalendarInfo> {
    let changes = calendar_changeset(patch)?;
    let (_, calendar) = collection::load_instance(store, instance_id, CollectionType::Calendar).await?;
    let instance = collection::update_instance(store, instance_id, changes).await?;
    Ok(CalendarInfo::new(instance, calendar))
}

/// ## Summary
/// Deletes a calendar instance; the owner's instance takes the calendar with it.
///
/// ## Errors
/// Returns [`ServiceError::NotFound`] for an unknown instance.
pub async fn delete_calendar(store: &dyn DavStore, instance_id: uuid::Uuid) -> ServiceResult<()> {
    collection::delete_instance(store, instance_id, CollectionType::Calendar).await
}

/// ## Summary
/// Returns the calendar's changes since `sync_token`.
///
/// `None` means the calendar is unknown.
///
/// ## Errors
/// Returns [`ServiceError::InvalidSyncToken`] for a malformed token.
pub async fn get_changes_for_calendar(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    sync_token: &str,
    limit: Option<usize>,
) -> ServiceResult<Option<ChangeSet>> {
    collection::get_changes(store, collection_id, CollectionType::Calendar, sync_token, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalends_core::constants::{PROP_CALENDAR_COLOR, PROP_DISPLAYNAME, SYNC_TOKEN_PREFIX};
    use kalends_db::db::memory::MemoryStore;

    #[test_log::test(tokio::test)]
    async fn create_with_defaults() {
        let store = MemoryStore::new();
        let props = NewCalendarProps {
            properties: PropPatch::new().set(PROP_DISPLAYNAME, "Home"),
            ..NewCalendarProps::default()
        };
        let calendar = create_calendar(&store, "principals/alice", "home", props).await.unwrap();
        assert_eq!(calendar.sync_token, 1);
        assert_eq!(calendar.ctag, format!("{SYNC_TOKEN_PREFIX}1"));
        assert_eq!(calendar.supported_components, vec!["VEVENT", "VTODO"]);
        assert_eq!(calendar.display_name.as_deref(), Some("Home"));
        assert_eq!(calendar.access, ShareAccess::Owner);
        assert!(!calendar.read_only);
    }

    #[test_log::test(tokio::test)]
    async fn create_rejects_bad_input() {
        let store = MemoryStore::new();
        let empty = NewCalendarProps {
            supported_components: Some(Vec::new()),
            ..NewCalendarProps::default()
        };
        assert!(matches!(
            create_calendar(&store, "principals/alice", "a", empty).await,
            Err(ServiceError::ValidationError(_))
        ));

        create_calendar(&store, "principals/alice", "b", NewCalendarProps::default())
            .await
            .unwrap();
        assert!(matches!(
            create_calendar(&store, "principals/alice", "b", NewCalendarProps::default()).await,
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(list_calendars(&store, "principals/alice").await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn update_is_all_or_nothing() {
        let store = MemoryStore::new();
        let calendar = create_calendar(&store, "principals/alice", "home", NewCalendarProps::default())
            .await
            .unwrap();

        let bad = PropPatch::new()
            .set(PROP_CALENDAR_COLOR, "#00ff00")
            .set("{DAV:}resourcetype", "x");
        assert!(update_calendar(&store, calendar.instance_id, &bad).await.is_err());
        let unchanged = list_calendars(&store, "principals/alice").await.unwrap();
        assert_eq!(unchanged[0].color, None);

        let good = PropPatch::new().set(PROP_CALENDAR_COLOR, "#00ff00");
        let updated = update_calendar(&store, calendar.instance_id, &good).await.unwrap();
        assert_eq!(updated.color.as_deref(), Some("#00ff00"));
        assert_eq!(updated.sync_token, 1);
    }

    #[test_log::test(tokio::test)]
    async fn delete_then_changes_report_unknown() {
        let store = MemoryStore::new();
        let calendar = create_calendar(&store, "principals/alice", "home", NewCalendarProps::default())
            .await
            .unwrap();
        delete_calendar(&store, calendar.instance_id).await.unwrap();
        assert!(list_calendars(&store, "principals/alice").await.unwrap().is_empty());
        assert_eq!(
            get_changes_for_calendar(&store, calendar.collection_id, "1", None).await.unwrap(),
            None
        );
    }
}
