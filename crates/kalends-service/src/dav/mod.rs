pub mod etag;
pub mod property;
pub mod service;
pub mod sync;
