//! Console platform: configuration, engine wiring and the message loop.
mod app;
mod cli;
mod config;
mod console;
mod effects;
mod persistence;

pub use app::run_app;
