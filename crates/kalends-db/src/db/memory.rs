//! In-process [`DavStore`] with the same observable semantics as
//! [`super::pg::PgStore`].
//!
//! All state sits behind one `tokio` `RwLock`; member writes hold the write
//! lock across the row write and the token bump, which serializes appends
//! per store.

use std::collections::{BTreeMap, HashMap};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::enums::{ChangeOperation, CollectionType, ShareAccess};
use crate::db::store::{DavStore, IndexPredicate, QueryCandidate};
use crate::error::{DbError, DbResult};
use crate::model::change::DavChange;
use crate::model::collection::{DavCollection, NewDavCollection};
use crate::model::instance::{DavInstance, DavInstanceChangeset, NewDavInstance};
use crate::model::object::{DavObject, DavObjectSummary, NewDavObject};
use crate::model::scheduling::{DavSchedulingObject, NewDavSchedulingObject};
use crate::model::subscription::{DavSubscription, DavSubscriptionChangeset, NewDavSubscription};

#[derive(Debug, Default)]
struct State {
    collections: HashMap<Uuid, DavCollection>,
    instances: BTreeMap<Uuid, DavInstance>,
    /// Keyed by `(collection, uri)` so a range scan lists one collection in uri order.
    objects: BTreeMap<(Uuid, String), DavObject>,
    changes: Vec<DavChange>,
    next_change_id: i64,
    subscriptions: BTreeMap<Uuid, DavSubscription>,
    scheduling: BTreeMap<(String, String), DavSchedulingObject>,
}

impl State {
    fn objects_in(&self, collection_id: Uuid) -> impl Iterator<Item = &DavObject> {
        self.objects
            .range((collection_id, String::new())..)
            .take_while(move |((id, _), _)| *id == collection_id)
            .map(|(_, object)| object)
    }

    fn instance_uri_taken(&self, principal_uri: Option<&str>, uri: &str) -> bool {
        principal_uri.is_some()
            && self.instances.values().any(|instance| {
                instance.principal_uri.as_deref() == principal_uri && instance.uri == uri
            })
    }

    fn append_change(
        &mut self,
        collection_id: Uuid,
        uri: &str,
        operation: ChangeOperation,
    ) -> DbResult<i64> {
        let collection = self
            .collections
            .get_mut(&collection_id)
            .ok_or(diesel::result::Error::NotFound)?;
        let token = collection.synctoken;
        collection.synctoken += 1;
        collection.updated_at = chrono::Utc::now();

        self.next_change_id += 1;
        self.changes.push(DavChange {
            id: self.next_change_id,
            collection_id,
            uri: uri.to_owned(),
            synctoken: token,
            operation,
        });
        tracing::debug!(%collection_id, uri, token, %operation, "Recorded change");
        Ok(token)
    }
}

/// Store that keeps everything in memory. Used by tests and for running
/// without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DavStore for MemoryStore {
    fn create_collection(
        &self,
        collection: NewDavCollection,
        owner: NewDavInstance,
    ) -> BoxFuture<'_, DbResult<(DavCollection, DavInstance)>> {
        async move {
            let mut state = self.state.write().await;
            if state.collections.contains_key(&collection.id) {
                return Err(DbError::unique_violation("dav_collection_pkey"));
            }
            if state.instance_uri_taken(owner.principal_uri.as_deref(), &owner.uri) {
                return Err(DbError::unique_violation("dav_instance_principal_uri_uri_key"));
            }

            let now = chrono::Utc::now();
            let stored = DavCollection {
                id: collection.id,
                collection_type: collection.collection_type,
                synctoken: 1,
                supported_components: collection.supported_components,
                created_at: now,
                updated_at: now,
            };
            let instance = owner.into_instance();
            state.collections.insert(stored.id, stored.clone());
            state.instances.insert(instance.id, instance.clone());
            Ok((stored, instance))
        }
        .boxed()
    }

    fn get_collection(&self, id: Uuid) -> BoxFuture<'_, DbResult<Option<DavCollection>>> {
        async move { Ok(self.state.read().await.collections.get(&id).cloned()) }.boxed()
    }

    fn get_instance(&self, id: Uuid) -> BoxFuture<'_, DbResult<Option<DavInstance>>> {
        async move { Ok(self.state.read().await.instances.get(&id).cloned()) }.boxed()
    }

    fn list_instances_for_principal<'a>(
        &'a self,
        principal_uri: &'a str,
        collection_type: CollectionType,
    ) -> BoxFuture<'a, DbResult<Vec<(DavInstance, DavCollection)>>> {
        async move {
            let state = self.state.read().await;
            let mut rows: Vec<_> = state
                .instances
                .values()
                .filter(|instance| instance.principal_uri.as_deref() == Some(principal_uri))
                .filter_map(|instance| {
                    let collection = state.collections.get(&instance.collection_id)?;
                    (collection.collection_type == collection_type)
                        .then(|| (instance.clone(), collection.clone()))
                })
                .collect();
            rows.sort_by(|(a, _), (b, _)| {
                a.calendar_order
                    .cmp(&b.calendar_order)
                    .then_with(|| a.uri.cmp(&b.uri))
            });
            Ok(rows)
        }
        .boxed()
    }

    fn list_instances_for_collection(
        &self,
        collection_id: Uuid,
    ) -> BoxFuture<'_, DbResult<Vec<DavInstance>>> {
        async move {
            let state = self.state.read().await;
            let mut instances: Vec<_> = state
                .instances
                .values()
                .filter(|instance| instance.collection_id == collection_id)
                .cloned()
                .collect();
            instances.sort_by(|a, b| a.uri.cmp(&b.uri));
            Ok(instances)
        }
        .boxed()
    }

    fn insert_instance(&self, instance: NewDavInstance) -> BoxFuture<'_, DbResult<DavInstance>> {
        async move {
            let mut state = self.state.write().await;
            if !state.collections.contains_key(&instance.collection_id) {
                return Err(DbError::DatabaseError(diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                    Box::new(String::from("dav_instance_collection_id_fkey")),
                )));
            }
            if state.instance_uri_taken(instance.principal_uri.as_deref(), &instance.uri) {
                return Err(DbError::unique_violation("dav_instance_principal_uri_uri_key"));
            }
            let instance = instance.into_instance();
            state.instances.insert(instance.id, instance.clone());
            Ok(instance)
        }
        .boxed()
    }

    fn update_instance(
        &self,
        id: Uuid,
        changes: DavInstanceChangeset,
    ) -> BoxFuture<'_, DbResult<Option<DavInstance>>> {
        async move {
            let mut state = self.state.write().await;
            Ok(state.instances.get_mut(&id).map(|instance| {
                changes.apply_to(instance);
                instance.clone()
            }))
        }
        .boxed()
    }

    fn delete_instance(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>> {
        async move { Ok(self.state.write().await.instances.remove(&id).is_some()) }.boxed()
    }

    fn delete_collection(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>> {
        async move {
            let mut state = self.state.write().await;
            if state.collections.remove(&id).is_none() {
                return Ok(false);
            }
            state.instances.retain(|_, instance| instance.collection_id != id);
            state.objects.retain(|(collection_id, _), _| *collection_id != id);
            state.changes.retain(|change| change.collection_id != id);
            Ok(true)
        }
        .boxed()
    }

    fn list_objects(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Vec<DavObjectSummary>>> {
        async move {
            let state = self.state.read().await;
            Ok(state.objects_in(collection_id).map(DavObjectSummary::from).collect())
        }
        .boxed()
    }

    fn get_object<'a>(
        &'a self,
        collection_id: Uuid,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<DavObject>>> {
        async move {
            let state = self.state.read().await;
            Ok(state.objects.get(&(collection_id, uri.to_owned())).cloned())
        }
        .boxed()
    }

    fn get_objects<'a>(
        &'a self,
        collection_id: Uuid,
        uris: &'a [String],
    ) -> BoxFuture<'a, DbResult<Vec<DavObject>>> {
        async move {
            let state = self.state.read().await;
            Ok(state
                .objects_in(collection_id)
                .filter(|object| uris.contains(&object.uri))
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn insert_object(&self, object: NewDavObject) -> BoxFuture<'_, DbResult<i64>> {
        async move {
            let mut state = self.state.write().await;
            if !state.collections.contains_key(&object.collection_id) {
                return Err(diesel::result::Error::NotFound.into());
            }
            let key = (object.collection_id, object.uri.clone());
            if state.objects.contains_key(&key) {
                return Err(DbError::unique_violation("dav_object_collection_id_uri_key"));
            }
            let (collection_id, uri) = key.clone();
            state.objects.insert(key, object.into_object(Uuid::new_v4()));
            state.append_change(collection_id, &uri, ChangeOperation::Added)
        }
        .boxed()
    }

    fn update_object(&self, object: NewDavObject) -> BoxFuture<'_, DbResult<Option<i64>>> {
        async move {
            let mut state = self.state.write().await;
            let key = (object.collection_id, object.uri.clone());
            let Some(existing) = state.objects.get(&key) else {
                return Ok(None);
            };
            let id = existing.id;
            let (collection_id, uri) = key.clone();
            state.objects.insert(key, object.into_object(id));
            state
                .append_change(collection_id, &uri, ChangeOperation::Modified)
                .map(Some)
        }
        .boxed()
    }

    fn delete_object<'a>(
        &'a self,
        collection_id: Uuid,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<i64>>> {
        async move {
            let mut state = self.state.write().await;
            if state.objects.remove(&(collection_id, uri.to_owned())).is_none() {
                return Ok(None);
            }
            state
                .append_change(collection_id, uri, ChangeOperation::Deleted)
                .map(Some)
        }
        .boxed()
    }

    fn find_object_by_uid<'a>(
        &'a self,
        principal_uri: &'a str,
        uid: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<(String, String)>>> {
        async move {
            let state = self.state.read().await;
            let mut owned: Vec<&DavInstance> = state
                .instances
                .values()
                .filter(|instance| {
                    instance.principal_uri.as_deref() == Some(principal_uri)
                        && instance.access == ShareAccess::Owner
                })
                .collect();
            owned.sort_by(|a, b| a.uri.cmp(&b.uri));

            Ok(owned.into_iter().find_map(|instance| {
                state
                    .objects_in(instance.collection_id)
                    .find(|object| object.uid.as_deref() == Some(uid))
                    .map(|object| (instance.uri.clone(), object.uri.clone()))
            }))
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
            let state = self.state.read().await;
            Ok(state
                .objects_in(collection_id)
                .filter(|object| predicate.matches(object))
                .map(|object| QueryCandidate {
                    uri: object.uri.clone(),
                    data: with_data.then(|| object.data.clone()),
                })
                .collect())
        }
        .boxed()
    }

    fn current_token(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Option<i64>>> {
        async move {
            let state = self.state.read().await;
            Ok(state
                .collections
                .get(&collection_id)
                .map(|collection| collection.synctoken))
        }
        .boxed()
    }

    fn member_uris(&self, collection_id: Uuid) -> BoxFuture<'_, DbResult<Vec<String>>> {
        async move {
            let state = self.state.read().await;
            Ok(state
                .objects_in(collection_id)
                .map(|object| object.uri.clone())
                .collect())
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
            let state = self.state.read().await;
            let mut changes: Vec<_> = state
                .changes
                .iter()
                .filter(|change| {
                    change.collection_id == collection_id
                        && (from..until).contains(&change.synctoken)
                })
                .cloned()
                .collect();
            changes.sort_by_key(|change| change.synctoken);
            Ok(changes)
        }
        .boxed()
    }

    fn list_subscriptions<'a>(
        &'a self,
        principal_uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Vec<DavSubscription>>> {
        async move {
            let state = self.state.read().await;
            let mut subscriptions: Vec<_> = state
                .subscriptions
                .values()
                .filter(|subscription| subscription.principal_uri == principal_uri)
                .cloned()
                .collect();
            subscriptions.sort_by(|a, b| {
                a.calendar_order
                    .cmp(&b.calendar_order)
                    .then_with(|| a.uri.cmp(&b.uri))
            });
            Ok(subscriptions)
        }
        .boxed()
    }

    fn insert_subscription(
        &self,
        subscription: NewDavSubscription,
    ) -> BoxFuture<'_, DbResult<DavSubscription>> {
        async move {
            let mut state = self.state.write().await;
            let taken = state.subscriptions.values().any(|existing| {
                existing.principal_uri == subscription.principal_uri && existing.uri == subscription.uri
            });
            if taken {
                return Err(DbError::unique_violation("dav_subscription_principal_uri_uri_key"));
            }
            let subscription = subscription.into_subscription();
            state.subscriptions.insert(subscription.id, subscription.clone());
            Ok(subscription)
        }
        .boxed()
    }

    fn update_subscription(
        &self,
        id: Uuid,
        changes: DavSubscriptionChangeset,
    ) -> BoxFuture<'_, DbResult<Option<DavSubscription>>> {
        async move {
            let mut state = self.state.write().await;
            Ok(state.subscriptions.get_mut(&id).map(|subscription| {
                changes.apply_to(subscription);
                subscription.clone()
            }))
        }
        .boxed()
    }

    fn delete_subscription(&self, id: Uuid) -> BoxFuture<'_, DbResult<bool>> {
        async move { Ok(self.state.write().await.subscriptions.remove(&id).is_some()) }.boxed()
    }

    fn insert_scheduling_object(
        &self,
        object: NewDavSchedulingObject,
    ) -> BoxFuture<'_, DbResult<DavSchedulingObject>> {
        async move {
            let mut state = self.state.write().await;
            let key = (object.principal_uri.clone(), object.uri.clone());
            if state.scheduling.contains_key(&key) {
                return Err(DbError::unique_violation("dav_scheduling_object_principal_uri_uri_key"));
            }
            let object = object.into_scheduling_object();
            state.scheduling.insert(key, object.clone());
            Ok(object)
        }
        .boxed()
    }

    fn get_scheduling_object<'a>(
        &'a self,
        principal_uri: &'a str,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Option<DavSchedulingObject>>> {
        async move {
            let state = self.state.read().await;
            Ok(state
                .scheduling
                .get(&(principal_uri.to_owned(), uri.to_owned()))
                .cloned())
        }
        .boxed()
    }

    fn list_scheduling_objects<'a>(
        &'a self,
        principal_uri: &'a str,
    ) -> BoxFuture<'a, DbResult<Vec<DavSchedulingObject>>> {
        async move {
            let state = self.state.read().await;
            Ok(state
                .scheduling
                .values()
                .filter(|object| object.principal_uri == principal_uri)
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn delete_scheduling_object<'a>(
        &'a self,
        principal_uri: &'a str,
        uri: &'a str,
    ) -> BoxFuture<'a, DbResult<bool>> {
        async move {
            let mut state = self.state.write().await;
            Ok(state
                .scheduling
                .remove(&(principal_uri.to_owned(), uri.to_owned()))
                .is_some())
        }
        .boxed()
    }
}
