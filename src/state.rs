use crate::engine::StreakEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<StreakEngine>,
}

impl AppState {
    pub fn new(engine: StreakEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
