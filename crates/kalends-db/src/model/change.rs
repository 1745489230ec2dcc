use diesel::{pg::Pg, prelude::*};

use crate::db::enums::ChangeOperation;
use crate::db::schema;

/// One entry of a collection's change log.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::dav_change)]
#[diesel(check_for_backend(Pg))]
pub struct DavChange {
    pub id: i64,
    pub collection_id: uuid::Uuid,
    pub uri: String,
    pub synctoken: i64,
    pub operation: ChangeOperation,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::dav_change)]
pub struct NewDavChange {
    pub collection_id: uuid::Uuid,
    pub uri: String,
    pub synctoken: i64,
    pub operation: ChangeOperation,
}
