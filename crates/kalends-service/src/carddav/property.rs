//! Enumerated address book properties.

use kalends_core::constants::{PROP_ADDRESSBOOK_DESCRIPTION, PROP_DISPLAYNAME};
use kalends_db::model::instance::DavInstanceChangeset;

use crate::dav::property::{EnumeratedProperty, PropPatch, resolve_patch};
use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressBookProperty {
    DisplayName,
    Description,
}

impl EnumeratedProperty for AddressBookProperty {
    const ALL: &'static [Self] = &[Self::DisplayName, Self::Description];

    fn clark_name(self) -> &'static str {
        match self {
            Self::DisplayName => PROP_DISPLAYNAME,
            Self::Description => PROP_ADDRESSBOOK_DESCRIPTION,
        }
    }
}

/// ## Summary
/// Maps an address book property patch onto instance columns.
///
/// ## Errors
/// Returns `UnsupportedProperty` if any name is not an [`AddressBookProperty`].
pub fn address_book_changeset(patch: &PropPatch) -> ServiceResult<DavInstanceChangeset> {
    let mut changes = DavInstanceChangeset::default();
    for (property, value) in resolve_patch::<AddressBookProperty>(patch)? {
        let value = Some(value.map(str::to_owned));
        match property {
            AddressBookProperty::DisplayName => changes.display_name = value,
            AddressBookProperty::Description => changes.description = value,
        }
    }
    Ok(changes)
}
