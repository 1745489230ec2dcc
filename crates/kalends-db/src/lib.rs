//! Persistence for kalends: the Diesel schema and models, query functions,
//! and the [`db::store::DavStore`] abstraction with its PostgreSQL and
//! in-memory implementations.

pub mod db;
pub mod error;
pub mod model;
