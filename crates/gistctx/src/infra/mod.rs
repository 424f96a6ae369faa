//! Infrastructure adapters for IO, git, config, and external integrations.

pub mod auth;
pub mod clipboard;
pub mod config;
pub mod fs;
pub mod github;
pub mod ignore;
pub mod logging;
pub mod notify;
