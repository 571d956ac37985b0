pub mod app;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod sync;
pub mod state;

pub use app::router;
pub use engine::StreakEngine;
pub use state::AppState;
pub use storage::{resolve_data_path, StreakStore};
