//! Command implementations.

pub mod completions;
pub mod info;
pub mod init;
pub mod install;
pub mod list;
pub mod sources;
pub mod uninstall;
