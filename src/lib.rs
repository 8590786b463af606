pub mod config;
pub mod errors;
pub mod feeds;
pub mod gateway;
pub mod middleware;
pub mod normalize;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod validate;

// Re-export commonly used types for easier access
pub use config::{Config, load_config};
pub use errors::{AppError, AppResult};
pub use server::{AppState, create_app, start_server};
