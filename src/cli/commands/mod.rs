//! Command implementations

pub mod entities;
pub mod generate;
pub mod init;
pub mod status;
pub mod validate;
