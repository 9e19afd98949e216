pub mod auth_cmd;
pub mod common;
pub mod config;
pub mod device;
pub mod resolve;
pub mod status;
pub mod sync;
