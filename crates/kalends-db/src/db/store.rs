//! Storage abstraction shared by the PostgreSQL and in-memory backends.
//!
//! Every member write (`insert_object`, `update_object`, `delete_object`)
//! appends to the change log as part of the same unit of work: the
//! collection token is advanced atomically and the change is recorded at the
//! token that was current before the bump. The returned token is the one the
//! change was recorded at.

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::db::enums::{CollectionType, ComponentType};
use crate::error::DbResult;
use crate::model::change::DavChange;
use crate::model::collection::{DavCollection, NewDavCollection};
use crate::model::instance::{DavInstance, DavInstanceChangeset, NewDavInstance};
use crate::model::object::{DavObject, DavObjectSummary, NewDavObject};
use crate::model::scheduling::{DavSchedulingObject, NewDavSchedulingObject};
use crate::model::subscription::{DavSubscription, DavSubscriptionChangeset, NewDavSubscription};

/// Predicate pushed down to the object index columns.
///
/// Occurrence bounds are Unix seconds. Objects without occurrence columns
/// never satisfy an occurrence bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexPredicate {
    pub component_type: Option<ComponentType>,
    /// `last_occurrence >= occurs_after`
    pub occurs_after: Option<i64>,
    /// `first_occurrence <= occurs_before`
    pub occurs_before: Option<i64>,
}

impl IndexPredicate {
    /// Matches every member of the collection.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Evaluates the predicate against a stored row.
    #[must_use]
    pub fn matches(&self, object: &DavObject) -> bool {
        if let Some(component_type) = self.component_type
            && object.component_type != Some(component_type)
        {
            return false;
        }
        if let Some(after) = self.occurs_after
            && object.last_occurrence.is_none_or(|last| last < after)
        {
            return false;
        }
        if let Some(before) = self.occurs_before
            && object.first_occurrence.is_none_or(|first| first > before)
        {
            return false;
        }
        true
    }
}

/// A member returned by [`DavStore::query_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCandidate {
    pub uri: String,
    /// Present only when the caller asked for payloads.
    pub data: Option<Vec<u8>>,
}

/// Persistent storage for collections, members, the change log,
/// subscriptions and scheduling inboxes.
pub trait DavStore: Send + Sync {
    // Collections and instances

    /// Creates a collection together with its owner instance.
    fn create_collection(
        &self,
        collection: NewDavCollection,
        owner: NewDavInstance,
    ) -> BoxFuture<'_, DbResult<(DavCollection, DavInstance)>>;

    fn get_collection(&self, id: Uuid) -> BoxFuture<'_, DbResult<Option<DavCollection>>>;

    fn get_instance(&self, id: Uuid) -> BoxFuture<'_, DbResult<Option<DavInstance>>>;

    /// Instances visible to `principal_uri`, ordered by `calendar_order` then uri.
    fn list_instances_for_principal<'a>(
        &'a self,
        principal_uri: &'a str,
        collection_type: CollectionType,
    ) -> BoxFuture<'a, DbResult<Vec<(DavInstance, DavCollection)>>>;

    fn list_instances_for_collection(&self, collection_id: Uuid)
    -> BoxFuture<'_, DbResult<Vec<DavInstance>>>;

    fn insert_instance(&self, instance: NewDavInstance) -> BoxFuture<'_, DbResult<DavInstance>>;

    /// Returns the updated row, or `None` if the instance does not exist.
    fn update_instance(
        &self,
        id: Uuid,
        changes: DavInstanceChangeset,
    ) -> BoxFuture<'_, DbResult<Option<DavInstance>>>;

    fn delete_instance(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>>;

    /// Deletes the collection with all of its instances, members and changes.
    fn delete_collection(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>>;

    // Members

    fn list_objects(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Vec<DavObjectSummary>>>;

    fn get_object<'a>(
        &'a self,
        collection_id: Uuid,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<DavObject>>>;

    fn get_objects<'a>(
        &'a self,
        collection_id: Uuid,
        uris: &'a [String],
    ) -> BoxFuture<'a, DbResult<Vec<DavObject>>>;

    /// Inserts a new member and records an `added` change.
    ///
    /// Fails with a unique violation if the uri is taken.
    fn insert_object(&self, object: NewDavObject) -> BoxFuture<'_, DbResult<i64>>;

    /// Replaces a member and records a `modified` change; `None` if absent.
    fn update_object(&self, object: NewDavObject) -> BoxFuture<'_, DbResult<Option<i64>>>;

    /// Deletes a member and records a `deleted` change; `None` if absent.
    fn delete_object<'a>(
        &'a self,
        collection_id: Uuid,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<i64>>>;

    /// Finds `(instance uri, object uri)` for a UID among collections the
    /// principal owns.
    fn find_object_by_uid<'a>(
        &'a self,
        principal_uri: &'a str,
        uid: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<(String, String)>>>;

    /// Members matching `predicate`, ordered by uri.
    fn query_objects<'a>(
        &'a self,
        collection_id: Uuid,
        predicate: &'a IndexPredicate,
        with_data: bool,
    ) -> BoxFuture<'a, DbResult<Vec<QueryCandidate>>>;

    // Change log

    fn current_token(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Option<i64>>>;

    fn member_uris(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Vec<String>>>;

    /// Change records with `from <= synctoken < until`, ascending by token.
    fn changes_between(
        &self,
        collection_id: Uuid,
        from: i64,
        until: i64,
    ) -> BoxFuture<'_, DbResult<Vec<DavChange>>>;

    // Subscriptions

    fn list_subscriptions<'a>(
        &'a self,
        principal_uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Vec<DavSubscription>>>;

    fn insert_subscription(
        &self,
        subscription: NewDavSubscription,
    ) -> BoxFuture<'_, DbResult<DavSubscription>>;

    fn update_subscription(
        &self,
        id: Uuid,
        changes: DavSubscriptionChangeset,
    ) -> BoxFuture<'_, DbResult<Option<DavSubscription>>>;

    fn delete_subscription(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>>;

    // Scheduling inbox

    fn insert_scheduling_object(
        &self,
        object: NewDavSchedulingObject,
    ) -> BoxFuture<'_, DbResult<DavSchedulingObject>>;

    fn get_scheduling_object<'a>(
        &'a self,
        principal_uri: &'a str,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<DavSchedulingObject>>>;

    fn list_scheduling_objects<'a>(
        &'a self,
        principal_uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Vec<DavSchedulingObject>>>;

    fn delete_scheduling_object<'a>(
        &'a self,
        principal_uri: &'a str,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<bool>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalends_core::types;

    fn object(component: Option<types::ComponentType>, first: Option<i64>, last: Option<i64>) -> DavObject {
        DavObject {
            id: Uuid::new_v4(),
            collection_id: Uuid::new_v4(),
            uri: "a.ics".to_owned(),
            data: Vec::new(),
            etag: String::new(),
            size: 0,
            last_modified: chrono::Utc::now(),
            component_type: component.map(ComponentType::from),
            first_occurrence: first,
            last_occurrence: last,
            uid: None,
        }
    }

    #[test_log::test]
    fn predicate_bounds_are_inclusive() {
        let event = object(Some(types::ComponentType::VEvent), Some(100), Some(200));
        let predicate = IndexPredicate {
            component_type: Some(ComponentType(types::ComponentType::VEvent)),
            occurs_after: Some(200),
            occurs_before: Some(100),
        };
        assert!(predicate.matches(&event));
        assert!(!IndexPredicate { occurs_after: Some(201), ..IndexPredicate::all() }.matches(&event));
        assert!(!IndexPredicate { occurs_before: Some(99), ..IndexPredicate::all() }.matches(&event));
    }

    #[test_log::test]
    fn predicate_component_and_missing_columns() {
        let todo = object(Some(types::ComponentType::VTodo), None, None);
        let events = IndexPredicate {
            component_type: Some(ComponentType(types::ComponentType::VEvent)),
            ..IndexPredicate::all()
        };
        assert!(!events.matches(&todo));
        assert!(IndexPredicate::all().matches(&todo));
        assert!(!IndexPredicate { occurs_after: Some(0), ..IndexPredicate::all() }.matches(&todo));
    }
}
