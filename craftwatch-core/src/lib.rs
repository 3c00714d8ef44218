// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod platforms;
pub mod probe;
pub mod services;
pub mod tasks;

pub use config::AppConfig;
pub use error::Error;
