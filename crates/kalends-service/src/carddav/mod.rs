pub mod property;
pub mod service;
