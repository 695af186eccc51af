use std::sync::Arc;

use crate::config::StatsConfig;
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub stats: Arc<StatsConfig>,
}
