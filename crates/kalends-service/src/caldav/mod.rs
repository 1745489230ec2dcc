pub mod denormalize;
pub mod property;
pub mod query;
pub mod service;
