// File: src/tasks/mod.rs

pub mod status_refresh;

pub use status_refresh::{spawn_status_refresh_task, RefreshScheduler};
