use diesel::{pg::Pg, prelude::*};

use crate::db::enums::{InviteStatus, ShareAccess};
use crate::db::schema;

/// A principal's view of a collection.
///
/// The owner holds one instance with [`ShareAccess::Owner`]; every sharee
/// holds another pointing at the same collection.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::dav_instance)]
#[diesel(check_for_backend(Pg))]
pub struct DavInstance {
    pub id: uuid::Uuid,
    pub collection_id: uuid::Uuid,
    pub principal_uri: Option<String>,
    pub uri: String,
    pub access: ShareAccess,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub calendar_order: i32,
    pub calendar_color: Option<String>,
    pub transparent: bool,
    pub share_href: Option<String>,
    pub share_display_name: Option<String>,
    pub invite_status: InviteStatus,
}

/// Insert struct for creating new collection instances
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::dav_instance)]
pub struct NewDavInstance {
    pub id: uuid::Uuid,
    pub collection_id: uuid::Uuid,
    pub principal_uri: Option<String>,
    pub uri: String,
    pub access: ShareAccess,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub calendar_order: i32,
    pub calendar_color: Option<String>,
    pub transparent: bool,
    pub share_href: Option<String>,
    pub share_display_name: Option<String>,
    pub invite_status: InviteStatus,
}

impl NewDavInstance {
    /// ## Summary
    /// An owner instance with default display metadata.
    #[must_use]
    pub fn owner(collection_id: uuid::Uuid, principal_uri: &str, uri: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            collection_id,
            principal_uri: Some(principal_uri.to_owned()),
            uri: uri.to_owned(),
            access: ShareAccess::Owner,
            display_name: None,
            description: None,
            timezone: None,
            calendar_order: 0,
            calendar_color: None,
            transparent: false,
            share_href: None,
            share_display_name: None,
            invite_status: InviteStatus::Accepted,
        }
    }

    /// Materializes the row as stored, for stores that do not round-trip.
    #[must_use]
    pub fn into_instance(self) -> DavInstance {
        DavInstance {
            id: self.id,
            collection_id: self.collection_id,
            principal_uri: self.principal_uri,
            uri: self.uri,
            access: self.access,
            display_name: self.display_name,
            description: self.description,
            timezone: self.timezone,
            calendar_order: self.calendar_order,
            calendar_color: self.calendar_color,
            transparent: self.transparent,
            share_href: self.share_href,
            share_display_name: self.share_display_name,
            invite_status: self.invite_status,
        }
    }
}

/// Partial update of an instance.
///
/// `Some(None)` clears a nullable column; `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = schema::dav_instance)]
pub struct DavInstanceChangeset {
    pub access: Option<ShareAccess>,
    pub display_name: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub timezone: Option<Option<String>>,
    pub calendar_order: Option<i32>,
    pub calendar_color: Option<Option<String>>,
    pub transparent: Option<bool>,
    pub share_display_name: Option<Option<String>>,
    pub invite_status: Option<InviteStatus>,
}

impl DavInstanceChangeset {
    /// True when applying the changeset would not touch any column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the changeset to an in-memory row.
    pub fn apply_to(&self, instance: &mut DavInstance) {
        if let Some(access) = self.access {
            instance.access = access;
        }
        if let Some(display_name) = &self.display_name {
            instance.display_name.clone_from(display_name);
        }
        if let Some(description) = &self.description {
            instance.description.clone_from(description);
        }
        if let Some(timezone) = &self.timezone {
            instance.timezone.clone_from(timezone);
        }
        if let Some(order) = self.calendar_order {
            instance.calendar_order = order;
        }
        if let Some(color) = &self.calendar_color {
            instance.calendar_color.clone_from(color);
        }
        if let Some(transparent) = self.transparent {
            instance.transparent = transparent;
        }
        if let Some(share_display_name) = &self.share_display_name {
            instance.share_display_name.clone_from(share_display_name);
        }
        if let Some(status) = self.invite_status {
            instance.invite_status = status;
        }
    }
}
