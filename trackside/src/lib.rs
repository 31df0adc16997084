pub mod app;
pub mod behavior;
pub mod config;
pub mod engine;
pub mod export;
pub mod feedback;
pub mod gesture;
pub mod health;
pub mod store;
pub mod ui;

pub const APP_NAME: &str = "trackside";
