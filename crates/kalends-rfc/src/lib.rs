//! Calendar data handling for kalends: parsing, date values, recurrence
//! expansion and calendar-query filter evaluation.

pub mod error;
pub mod rfc;
