//! Database enum types with Diesel serialization.
//!
//! Text-backed enums map to CHECK-constrained `TEXT` columns; the sharing and
//! change-log enums are stored as their `SMALLINT` protocol codes.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{SmallInt, Text};
use std::fmt;
use std::io::Write;

use kalends_core::types;

/// Collection type for DAV storage.
///
/// Maps to `dav_collection.collection_type` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum CollectionType {
    Calendar,
    Addressbook,
}

impl ToSql<Text, Pg> for CollectionType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for CollectionType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"calendar" => Ok(Self::Calendar),
            b"addressbook" => Ok(Self::Addressbook),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl CollectionType {
    /// Returns the database string representation of this collection type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Addressbook => "addressbook",
        }
    }
}

impl From<CollectionType> for types::CollectionType {
    fn from(db_type: CollectionType) -> Self {
        match db_type {
            CollectionType::Calendar => Self::Calendar,
            CollectionType::Addressbook => Self::Addressbook,
        }
    }
}

impl From<types::CollectionType> for CollectionType {
    fn from(core_type: types::CollectionType) -> Self {
        match core_type {
            types::CollectionType::Calendar => Self::Calendar,
            types::CollectionType::Addressbook => Self::Addressbook,
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary component of a calendar object.
///
/// Maps to `dav_object.component_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct ComponentType(pub types::ComponentType);

impl ToSql<Text, Pg> for ComponentType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.0.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ComponentType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let text = std::str::from_utf8(bytes.as_bytes())?;
        Ok(Self(text.parse()?))
    }
}

impl From<types::ComponentType> for ComponentType {
    fn from(component: types::ComponentType) -> Self {
        Self(component)
    }
}

impl From<ComponentType> for types::ComponentType {
    fn from(component: ComponentType) -> Self {
        component.0
    }
}

/// Access a principal has to a shared collection instance.
///
/// Stored as its sharing protocol code in `dav_instance.access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = SmallInt)]
pub enum ShareAccess {
    Owner,
    Read,
    ReadWrite,
    NoAccess,
}

impl ShareAccess {
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Owner => 1,
            Self::Read => 2,
            Self::ReadWrite => 3,
            Self::NoAccess => 4,
        }
    }

    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Owner),
            2 => Some(Self::Read),
            3 => Some(Self::ReadWrite),
            4 => Some(Self::NoAccess),
            _ => None,
        }
    }

    /// True for access levels that permit modifying members.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Owner | Self::ReadWrite)
    }
}

impl ToSql<SmallInt, Pg> for ShareAccess {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&self.code().to_be_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<SmallInt, Pg> for ShareAccess {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let code = <i16 as FromSql<SmallInt, Pg>>::from_sql(bytes)?;
        Self::from_code(code).ok_or_else(|| format!("Unrecognized share access {code}").into())
    }
}

/// Reply state of a sharing invitation.
///
/// Stored as its sharing protocol code in `dav_instance.invite_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = SmallInt)]
pub enum InviteStatus {
    NoResponse,
    Accepted,
    Declined,
    Invalid,
}

impl InviteStatus {
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::NoResponse => 1,
            Self::Accepted => 2,
            Self::Declined => 3,
            Self::Invalid => 4,
        }
    }

    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::NoResponse),
            2 => Some(Self::Accepted),
            3 => Some(Self::Declined),
            4 => Some(Self::Invalid),
            _ => None,
        }
    }
}

impl ToSql<SmallInt, Pg> for InviteStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&self.code().to_be_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<SmallInt, Pg> for InviteStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let code = <i16 as FromSql<SmallInt, Pg>>::from_sql(bytes)?;
        Self::from_code(code).ok_or_else(|| format!("Unrecognized invite status {code}").into())
    }
}

/// Kind of member mutation recorded in the change log.
///
/// Maps to `dav_change.operation` (1 = added, 2 = modified, 3 = deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = SmallInt)]
pub enum ChangeOperation {
    Added,
    Modified,
    Deleted,
}

impl ChangeOperation {
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Added => 1,
            Self::Modified => 2,
            Self::Deleted => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Added),
            2 => Some(Self::Modified),
            3 => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl ToSql<SmallInt, Pg> for ChangeOperation {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&self.code().to_be_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<SmallInt, Pg> for ChangeOperation {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let code = <i16 as FromSql<SmallInt, Pg>>::from_sql(bytes)?;
        Self::from_code(code).ok_or_else(|| format!("Unrecognized change operation {code}").into())
    }
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        })
    }
}
