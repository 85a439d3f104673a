//! Shared state passed to all API handlers

use std::sync::Arc;

use crate::dashboard::Dashboard;
use crate::software::SoftwareStore;

#[derive(Clone)]
pub struct ApiState {
    pub dashboard: Arc<Dashboard>,
    pub software: Arc<dyn SoftwareStore>,
}

impl ApiState {
    pub fn new(dashboard: Arc<Dashboard>, software: Arc<dyn SoftwareStore>) -> Self {
        Self {
            dashboard,
            software,
        }
    }
}
