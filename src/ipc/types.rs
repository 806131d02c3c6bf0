use crate::config::ServiceConfig;
use crate::store::ContentStore;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: ServiceConfig,
    pub store: Option<ContentStore>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        AppState {
            config,
            store: None,
        }
    }
}
