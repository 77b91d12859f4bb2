use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::LifecycleConfig;
use crate::modules::events::SiteEvent;
use crate::platform::{PageEvent, TaskFailure};

const REGISTER: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("offline caching is not supported by this host")]
    Unsupported,
    #[error("registration of {script} failed: {reason}")]
    Failed { script: String, reason: String },
}

/// Host hook that installs the offline-caching script.
#[async_trait]
pub trait OfflineRegistrar: Send + Sync {
    async fn register(&self, script: &str) -> Result<(), RegistrationError>;
}

/// Registers the offline cache once the page has loaded. Never fatal.
pub struct OfflineCache {
    config: LifecycleConfig,
    registrar: Arc<dyn OfflineRegistrar>,
    requested: bool,
}

impl std::fmt::Debug for OfflineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineCache")
            .field("script", &self.config.offline_script)
            .field("requested", &self.requested)
            .finish()
    }
}

impl OfflineCache {
    pub fn new(config: LifecycleConfig, registrar: Arc<dyn OfflineRegistrar>) -> Self {
        Self {
            config,
            registrar,
            requested: false,
        }
    }
}

impl BehaviorUnit for OfflineCache {
    fn name(&self) -> &'static str {
        "offline-cache"
    }

    fn start(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Load if !self.requested => {
                self.requested = true;
                let registrar = self.registrar.clone();
                let script = self.config.offline_script.clone();
                ctx.spawn(REGISTER, async move {
                    registrar
                        .register(&script)
                        .await
                        .map_err(|err| TaskFailure::new(err.to_string()))
                });
            }
            PageEvent::TaskComplete { tag: REGISTER, result } => {
                let detail = result.as_ref().err().map(|failure| failure.message.clone());
                ctx.emit(SiteEvent::registration(
                    self.config.offline_script.clone(),
                    result.is_ok(),
                    detail,
                ));
            }
            _ => {}
        }
        Ok(())
    }
}
