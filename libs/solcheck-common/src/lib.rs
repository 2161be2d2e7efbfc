pub mod config;
pub mod layout;
pub mod template;
pub mod types;
