pub mod entry;
pub mod mood;
pub mod preferences;
pub mod user;
