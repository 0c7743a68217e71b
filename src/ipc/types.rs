use std::path::PathBuf;

use eunhad::config::{Config, DEFAULT_ADMIN_SECRET};
use eunhad::{AdminGate, LocationRegistry, Records};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything opened by `workspace.select`.
pub struct Workspace {
    pub path: PathBuf,
    pub config: Config,
    pub records: Records,
    pub registry: LocationRegistry,
}

pub struct AppState {
    pub gate: AdminGate,
    pub workspace: Option<Workspace>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            gate: AdminGate::new(DEFAULT_ADMIN_SECRET),
            workspace: None,
        }
    }
}
