// src/state.rs
use std::sync::Arc;

use crate::config::Config;

pub type SharedState = Arc<AppState>;

/// Immutable per-process state. Handlers share nothing mutable.
pub struct AppState {
    pub cfg: Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }
}
