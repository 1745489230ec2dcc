//! Calendar subscriptions: externally sourced, read-only calendars.

use kalends_core::constants::SUBSCRIPTION_COMPONENTS;
use kalends_db::db::store::DavStore;
use kalends_db::model::subscription::{DavSubscription, NewDavSubscription};

use crate::caldav::property::subscription_changeset;
use crate::dav::property::PropPatch;
use crate::error::{ServiceError, ServiceResult};

/// A subscription with the component set it advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub subscription: DavSubscription,
    pub supported_components: Vec<String>,
}

impl From<DavSubscription> for SubscriptionInfo {
    fn from(subscription: DavSubscription) -> Self {
        Self {
            subscription,
            supported_components: SUBSCRIPTION_COMPONENTS.iter().map(|&c| c.to_owned()).collect(),
        }
    }
}

/// ## Summary
/// Lists a principal's subscriptions.
///
/// ## Errors
/// Returns database errors.
pub async fn list_subscriptions(
    store: &dyn DavStore,
    principal_uri: &str,
) -> ServiceResult<Vec<SubscriptionInfo>> {
    let subscriptions = store.list_subscriptions(principal_uri).await?;
    Ok(subscriptions.into_iter().map(SubscriptionInfo::from).collect())
}

/// ## Summary
/// Creates a subscription from a property patch that must name a source.
///
/// ## Errors
/// Returns [`ServiceError::ValidationError`] without a source, property
/// mapping errors for a bad patch and [`ServiceError::Conflict`] if the uri
/// is taken.
#[tracing::instrument(skip(store, properties))]
pub async fn create_subscription(
    store: &dyn DavStore,
    principal_uri: &str,
    uri: &str,
    properties: &PropPatch,
) -> ServiceResult<SubscriptionInfo> {
    let changes = subscription_changeset(properties, chrono::Utc::now())?;
    let source = changes
        .source
        .ok_or_else(|| ServiceError::ValidationError("subscription source is required".to_owned()))?;

    let subscription = NewDavSubscription {
        id: uuid::Uuid::new_v4(),
        principal_uri: principal_uri.to_owned(),
        uri: uri.to_owned(),
        source,
        display_name: changes.display_name.flatten(),
        refresh_rate: changes.refresh_rate.flatten(),
        calendar_order: changes.calendar_order.unwrap_or_default(),
        calendar_color: changes.calendar_color.flatten(),
        strip_todos: changes.strip_todos.unwrap_or_default(),
        strip_alarms: changes.strip_alarms.unwrap_or_default(),
        strip_attachments: changes.strip_attachments.unwrap_or_default(),
        last_modified: changes.last_modified,
    };

    let created = store
        .insert_subscription(subscription)
        .await
        .map_err(|err| {
            if err.is_unique_violation() {
                ServiceError::Conflict(format!("{principal_uri}/{uri} already exists"))
            } else {
                err.into()
            }
        })?;
    tracing::info!(subscription_id = %created.id, "Created subscription");
    Ok(created.into())
}

/// ## Summary
/// Applies a property patch to a subscription.
///
/// ## Errors
/// Returns property mapping errors for a bad patch and
/// [`ServiceError::NotFound`] for an unknown subscription.
pub async fn update_subscription(
    store: &dyn DavStore,
    subscription_id: uuid::Uuid,
    patch: &PropPatch,
) -> ServiceResult<SubscriptionInfo> {
    let changes = subscription_changeset(patch, chrono::Utc::now())?;
    store
        .update_subscription(subscription_id, changes)
        .await?
        .map(SubscriptionInfo::from)
        .ok_or_else(|| ServiceError::NotFound(format!("subscription {subscription_id}")))
}

/// ## Errors
/// Returns [`ServiceError::NotFound`] for an unknown subscription.
pub async fn delete_subscription(store: &dyn DavStore, subscription_id: uuid::Uuid) -> ServiceResult<()> {
    if store.delete_subscription(subscription_id).await? {
        tracing::info!(%subscription_id, "Deleted subscription");
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("subscription {subscription_id}")))
    }
}
