//! Application service layer - use cases, config, store wiring

pub mod app;
pub mod config;
pub mod repository;
