use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// An iTIP message delivered to a principal's scheduling inbox.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::dav_scheduling_object)]
#[diesel(check_for_backend(Pg))]
pub struct DavSchedulingObject {
    pub id: uuid::Uuid,
    pub principal_uri: String,
    pub uri: String,
    pub data: Vec<u8>,
    pub etag: String,
    pub size: i64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::dav_scheduling_object)]
pub struct NewDavSchedulingObject {
    pub id: uuid::Uuid,
    pub principal_uri: String,
    pub uri: String,
    pub data: Vec<u8>,
    pub etag: String,
    pub size: i64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

impl NewDavSchedulingObject {
    #[must_use]
    pub fn into_scheduling_object(self) -> DavSchedulingObject {
        DavSchedulingObject {
            id: self.id,
            principal_uri: self.principal_uri,
            uri: self.uri,
            data: self.data,
            etag: self.etag,
            size: self.size,
            last_modified: self.last_modified,
        }
    }
}
