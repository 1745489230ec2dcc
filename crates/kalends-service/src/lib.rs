//! The kalends service layer: change tracking and sync, denormalization of
//! calendar data, calendar queries, and the calendar and address book
//! operations built on top of a [`kalends_db::db::store::DavStore`].

pub mod caldav;
pub mod carddav;
pub mod dav;
pub mod error;
