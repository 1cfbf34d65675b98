pub mod bootstrap;
pub mod camera;
pub mod config;
pub mod episode;
pub mod notify;
pub mod pacing;
pub mod sensor;
