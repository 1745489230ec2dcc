//! kalends - integration test support.
//!
//! Re-exports the workspace crates and provides payload builders and store
//! fixtures shared by the integration tests.

pub mod ics;
pub mod store;

pub use kalends_core as core;
pub use kalends_db as db;
pub use kalends_rfc as rfc;
pub use kalends_service as service;
