pub mod config;
pub mod logging;
pub mod messages;
pub mod tenant;
