//! Gateway state

use crate::presence::PresenceTracker;
use social_common::AppConfig;
use social_service::ServiceContext;
use std::sync::Arc;

/// Shared dependencies of every socket
#[derive(Clone)]
pub struct GatewayState {
    service_context: Arc<ServiceContext>,
    presence: Arc<PresenceTracker>,
    config: Arc<AppConfig>,
}

impl GatewayState {
    pub fn new(service_context: ServiceContext, presence: Arc<PresenceTracker>, config: AppConfig) -> Self {
        Self {
            service_context: Arc::new(service_context),
            presence,
            config: Arc::new(config),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("presence", &self.presence)
            .field("config", &"AppConfig")
            .finish()
    }
}
