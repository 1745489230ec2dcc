pub mod collection;
pub mod object;
