use diesel::{pg::Pg, prelude::*};

use crate::db::enums::ComponentType;
use crate::db::schema;

/// A stored member object (calendar object or card) with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::dav_object)]
#[diesel(check_for_backend(Pg))]
pub struct DavObject {
    pub id: uuid::Uuid,
    pub collection_id: uuid::Uuid,
    pub uri: String,
    pub data: Vec<u8>,
    pub etag: String,
    pub size: i64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub component_type: Option<ComponentType>,
    pub first_occurrence: Option<i64>,
    pub last_occurrence: Option<i64>,
    pub uid: Option<String>,
}

/// Member metadata without the payload, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = schema::dav_object)]
#[diesel(check_for_backend(Pg))]
pub struct DavObjectSummary {
    pub uri: String,
    pub etag: String,
    pub size: i64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub component_type: Option<ComponentType>,
}

impl From<&DavObject> for DavObjectSummary {
    fn from(object: &DavObject) -> Self {
        Self {
            uri: object.uri.clone(),
            etag: object.etag.clone(),
            size: object.size,
            last_modified: object.last_modified,
            component_type: object.component_type,
        }
    }
}

/// Insert/replace struct for a member object.
///
/// Used for both creation and full replacement: every derived column is
/// recomputed on each write.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schema::dav_object)]
#[diesel(treat_none_as_null = true)]
pub struct NewDavObject {
    pub collection_id: uuid::Uuid,
    pub uri: String,
    pub data: Vec<u8>,
    pub etag: String,
    pub size: i64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub component_type: Option<ComponentType>,
    pub first_occurrence: Option<i64>,
    pub last_occurrence: Option<i64>,
    pub uid: Option<String>,
}

impl NewDavObject {
    /// Materializes the row as stored, for stores that do not round-trip.
    #[must_use]
    pub fn into_object(self, id: uuid::Uuid) -> DavObject {
        DavObject {
            id,
            collection_id: self.collection_id,
            uri: self.uri,
            data: self.data,
            etag: self.etag,
            size: self.size,
            last_modified: self.last_modified,
            component_type: self.component_type,
            first_occurrence: self.first_occurrence,
            last_occurrence: self.last_occurrence,
            uid: self.uid,
        }
    }
}
