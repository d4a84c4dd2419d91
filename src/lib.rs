//! imgtrim
//!
//! A small web service that reports the size of an uploaded image and
//! offers truncated copies of it at fixed quality levels.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
