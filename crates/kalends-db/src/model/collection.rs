use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::CollectionType, schema};

/// DAV collection (`CalDAV` calendar or `CardDAV` addressbook).
///
/// Display metadata lives on [`super::instance::DavInstance`] so each sharee
/// can keep their own.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::dav_collection)]
#[diesel(check_for_backend(Pg))]
pub struct DavCollection {
    pub id: uuid::Uuid,
    pub collection_type: CollectionType,
    pub synctoken: i64,
    pub supported_components: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for creating new DAV collections
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::dav_collection)]
pub struct NewDavCollection {
    pub id: uuid::Uuid,
    pub collection_type: CollectionType,
    pub supported_components: Vec<String>,
}
