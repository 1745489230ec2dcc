use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// A subscribed (read-only, externally sourced) calendar.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::dav_subscription)]
#[diesel(check_for_backend(Pg))]
pub struct DavSubscription {
    pub id: uuid::Uuid,
    pub principal_uri: String,
    pub uri: String,
    pub source: String,
    pub display_name: Option<String>,
    pub refresh_rate: Option<String>,
    pub calendar_order: i32,
    pub calendar_color: Option<String>,
    pub strip_todos: bool,
    pub strip_alarms: bool,
    pub strip_attachments: bool,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::dav_subscription)]
pub struct NewDavSubscription {
    pub id: uuid::Uuid,
    pub principal_uri: String,
    pub uri: String,
    pub source: String,
    pub display_name: Option<String>,
    pub refresh_rate: Option<String>,
    pub calendar_order: i32,
    pub calendar_color: Option<String>,
    pub strip_todos: bool,
    pub strip_alarms: bool,
    pub strip_attachments: bool,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

impl NewDavSubscription {
    #[must_use]
    pub fn into_subscription(self) -> DavSubscription {
        DavSubscription {
            id: self.id,
            principal_uri: self.principal_uri,
            uri: self.uri,
            source: self.source,
            display_name: self.display_name,
            refresh_rate: self.refresh_rate,
            calendar_order: self.calendar_order,
            calendar_color: self.calendar_color,
            strip_todos: self.strip_todos,
            strip_alarms: self.strip_alarms,
            strip_attachments: self.strip_attachments,
            last_modified: self.last_modified,
        }
    }
}

/// Partial update of a subscription; `last_modified` is always set.
#[derive(Debug, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = schema::dav_subscription)]
pub struct DavSubscriptionChangeset {
    pub source: Option<String>,
    pub display_name: Option<Option<String>>,
    pub refresh_rate: Option<Option<String>>,
    pub calendar_order: Option<i32>,
    pub calendar_color: Option<Option<String>>,
    pub strip_todos: Option<bool>,
    pub strip_alarms: Option<bool>,
    pub strip_attachments: Option<bool>,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

impl DavSubscriptionChangeset {
    #[must_use]
    pub fn touch(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            source: None,
            display_name: None,
            refresh_rate: None,
            calendar_order: None,
            calendar_color: None,
            strip_todos: None,
            strip_alarms: None,
            strip_attachments: None,
            last_modified: now,
        }
    }

    /// Applies the changeset to an in-memory row.
    pub fn apply_to(&self, subscription: &mut DavSubscription) {
        if let Some(source) = &self.source {
            subscription.source.clone_from(source);
        }
        if let Some(display_name) = &self.display_name {
            subscription.display_name.clone_from(display_name);
        }
        if let Some(refresh_rate) = &self.refresh_rate {
            subscription.refresh_rate.clone_from(refresh_rate);
        }
        if let Some(order) = self.calendar_order {
            subscription.calendar_order = order;
        }
        if let Some(color) = &self.calendar_color {
            subscription.calendar_color.clone_from(color);
        }
        if let Some(strip) = self.strip_todos {
            subscription.strip_todos = strip;
        }
        if let Some(strip) = self.strip_alarms {
            subscription.strip_alarms = strip;
        }
        if let Some(strip) = self.strip_attachments {
            subscription.strip_attachments = strip;
        }
        subscription.last_modified = self.last_modified;
    }
}
