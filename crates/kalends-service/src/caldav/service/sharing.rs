//! Calendar sharing.
//!
//! Every sharee gets an instance of the shared collection. The owner's
//! instance is the only one allowed to change the invite list.

use kalends_db::db::enums::{CollectionType, InviteStatus, ShareAccess};
use kalends_db::db::store::DavStore;
use kalends_db::model::instance::{DavInstance, DavInstanceChangeset, NewDavInstance};

use crate::dav::service::collection::{load_instance, require_collection};
use crate::error::{ServiceError, ServiceResult};

/// Requested share for one sharee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sharee {
    /// Address the sharer used, usually `mailto:`.
    pub href: String,
    /// Principal the href resolved to, if any.
    pub principal: Option<String>,
    pub access: ShareAccess,
    pub display_name: Option<String>,
}

/// Current share state of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub href: String,
    pub principal: Option<String>,
    pub access: ShareAccess,
    pub invite_status: InviteStatus,
    pub display_name: Option<String>,
}

impl From<DavInstance> for Invite {
    fn from(instance: DavInstance) -> Self {
        Self {
            href: instance
                .share_href
                .or_else(|| instance.principal_uri.clone())
                .unwrap_or_default(),
            principal: instance.principal_uri,
            access: instance.access,
            invite_status: instance.invite_status,
            display_name: instance.share_display_name,
        }
    }
}

fn invite_status_for(sharee: &Sharee) -> InviteStatus {
    if sharee.principal.is_some() {
        InviteStatus::Accepted
    } else {
        InviteStatus::Invalid
    }
}

fn sharee_instance(owner: &DavInstance, sharee: &Sharee) -> NewDavInstance {
    NewDavInstance {
        id: uuid::Uuid::new_v4(),
        collection_id: owner.collection_id,
        principal_uri: sharee.principal.clone(),
        uri: uuid::Uuid::new_v4().to_string(),
        access: sharee.access,
        display_name: owner.display_name.clone(),
        description: owner.description.clone(),
        timezone: owner.timezone.clone(),
        calendar_order: owner.calendar_order,
        calendar_color: owner.calendar_color.clone(),
        transparent: true,
        share_href: Some(sharee.href.clone()),
        share_display_name: sharee.display_name.clone(),
        invite_status: invite_status_for(sharee),
    }
}

/// ## Summary
/// Adds, updates and removes sharees of a calendar.
///
/// ## Side Effects
/// A sharee with [`ShareAccess::NoAccess`] loses their instance. A known
/// sharee (matched by href) has access, display name and status updated.
/// A new sharee gets an instance copying the owner's display metadata.
///
/// ## Errors
/// Returns [`ServiceError::Forbidden`] unless `instance_id` is the owner's
/// instance and [`ServiceError::ValidationError`] if a sharee asks for owner
/// access.
#[tracing::instrument(skip(store, sharees), fields(sharees = sharees.len()))]
pub async fn update_invites(
    store: &dyn DavStore,
    instance_id: uuid::Uuid,
    sharees: &[Sharee],
) -> ServiceResult<()> {
    let (owner, calendar) = load_instance(store, instance_id, CollectionType::Calendar).await?;
    if owner.access != ShareAccess::Owner {
        return Err(ServiceError::Forbidden(format!(
            "only the owner may share calendar {}",
            calendar.id
        )));
    }
    if sharees.iter().any(|sharee| sharee.access == ShareAccess::Owner) {
        return Err(ServiceError::ValidationError(
            "sharees cannot be granted owner access".to_owned(),
        ));
    }

    let existing = store.list_instances_for_collection(calendar.id).await?;
    for sharee in sharees {
        let current = existing.iter().find(|instance| {
            instance.access != ShareAccess::Owner
                && instance.share_href.as_deref() == Some(sharee.href.as_str())
        });

        match (sharee.access, current) {
            (ShareAccess::NoAccess, Some(instance)) => {
                store.delete_instance(instance.id).await?;
                tracing::info!(href = %sharee.href, "Removed sharee");
            }
            (ShareAccess::NoAccess, None) => {}
            (access, Some(instance)) => {
                let changes = DavInstanceChangeset {
                    access: Some(access),
                    share_display_name: Some(sharee.display_name.clone()),
                    invite_status: Some(invite_status_for(sharee)),
                    ..DavInstanceChangeset::default()
                };
                store.update_instance(instance.id, changes).await?;
                tracing::debug!(href = %sharee.href, ?access, "Updated sharee");
            }
            (access, None) => {
                store.insert_instance(sharee_instance(&owner, sharee)).await?;
                tracing::info!(href = %sharee.href, ?access, "Added sharee");
            }
        }
    }
    Ok(())
}

/// ## Summary
/// Lists the share state of every instance of a calendar, owner included.
///
/// ## Errors
/// Returns [`ServiceError::UnknownCollection`] for a missing calendar.
pub async fn get_invites(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
) -> ServiceResult<Vec<Invite>> {
    require_collection(store, collection_id, CollectionType::Calendar).await?;
    let instances = store.list_instances_for_collection(collection_id).await?;
    Ok(instances.into_iter().map(Invite::from).collect())
}
