//! Address book operations exposed to the protocol layer.

pub mod addressbook;
pub mod card;
