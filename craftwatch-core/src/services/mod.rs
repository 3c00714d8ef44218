// File: src/services/mod.rs

pub mod commands;
pub mod render;
pub mod status_publisher;
pub mod summary;
