//! CLI command handlers

pub mod init;
pub mod run;
pub mod status;
