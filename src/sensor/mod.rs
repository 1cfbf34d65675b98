pub mod config;
pub mod helpers;
pub mod motion;
