//! Diesel-async query functions, one module per table.
//!
//! Functions take a bare [`diesel_async::AsyncPgConnection`] so they can run
//! on a pooled connection or inside a transaction alike.

pub mod change;
pub mod collection;
pub mod instance;
pub mod object;
pub mod scheduling;
pub mod subscription;
