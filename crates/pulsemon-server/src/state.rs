use crate::service::MetricService;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MetricService>,
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: MetricService) -> Self {
        Self {
            service: Arc::new(service),
            start_time: Utc::now(),
        }
    }
}
