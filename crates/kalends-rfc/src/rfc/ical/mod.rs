//! iCalendar (RFC 5545) support.

pub mod core;
pub mod duration;
pub mod expand;
pub mod matcher;
pub mod parse;
pub mod values;
