//! CLI command implementations.

pub mod history;
pub mod login;
pub mod logout;
pub mod mark_read;
pub mod messages;
pub mod send;
pub mod show_config;
