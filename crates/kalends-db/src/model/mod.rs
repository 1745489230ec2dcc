pub mod change;
pub mod collection;
pub mod instance;
pub mod object;
pub mod scheduling;
pub mod subscription;
