pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod prompt;
pub mod share;

pub use config::ShareConfig;
pub use error::{AppError, AppResult};
