use std::sync::Arc;

use serde::Serialize;

use crate::constants::server::SERVICE_NAME;
use crate::data::{ownership::OwnershipSource, storage::BoxedStorage};

#[derive(Debug, Serialize)]
pub struct DetailedHealthStatus {
    pub status: String,
    pub version: String,
    pub service: String,
    pub components: HealthComponents,
}

#[derive(Debug, Serialize)]
pub struct HealthComponents {
    pub storage: ComponentHealth,
    pub ownership: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: None,
        }
    }

    fn unhealthy(message: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: Some(message),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

pub struct HealthService {
    storage: Arc<dyn BoxedStorage>,
    ownership: Arc<dyn OwnershipSource>,
}

impl HealthService {
    pub fn new(storage: Arc<dyn BoxedStorage>, ownership: Arc<dyn OwnershipSource>) -> Self {
        Self { storage, ownership }
    }

    pub async fn check_health(&self) -> DetailedHealthStatus {
        let storage = self.check_storage().await;
        let ownership = self.check_ownership().await;

        let status = if storage.is_healthy() && ownership.is_healthy() {
            "healthy"
        } else {
            "unhealthy"
        };

        DetailedHealthStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: SERVICE_NAME.to_string(),
            components: HealthComponents { storage, ownership },
        }
    }

    async fn check_storage(&self) -> ComponentHealth {
        match self.storage.health_check().await {
            Ok(true) => ComponentHealth::healthy(),
            Ok(false) => ComponentHealth::unhealthy("Storage reported unhealthy".to_string()),
            Err(e) => ComponentHealth::unhealthy(format!("Storage error: {e}")),
        }
    }

    async fn check_ownership(&self) -> ComponentHealth {
        match self.ownership.test_connection().await {
            Ok(()) => ComponentHealth::healthy(),
            Err(e) => ComponentHealth::unhealthy(format!("Ownership source error: {e}")),
        }
    }
}
