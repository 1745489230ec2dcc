//! Calendar operations exposed to the protocol layer.

pub mod calendar;
pub mod object;
pub mod scheduling;
pub mod sharing;
pub mod subscription;
