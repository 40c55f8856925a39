pub mod audience;
pub mod candidate;
pub mod item;
pub mod profile;
