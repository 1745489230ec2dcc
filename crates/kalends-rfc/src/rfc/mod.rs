pub mod filter;
pub mod ical;
pub mod text_match;
