pub mod flash;
pub mod layout;
pub mod modal;
pub mod render;
