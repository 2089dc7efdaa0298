use super::engine::{PowerAction, SharedDaemon};
use crate::error::Result;

/// Start/stop/restart for managed containers, by id or name.
pub struct PowerManager {
    daemon: SharedDaemon,
}

impl PowerManager {
    pub fn new(daemon: SharedDaemon) -> Self {
        Self { daemon }
    }

    pub async fn execute_action(&self, container: &str, action: PowerAction) -> Result<()> {
        let (doing, done) = match action {
            PowerAction::Start => ("Starting", "started"),
            PowerAction::Stop => ("Stopping", "stopped"),
            PowerAction::Restart => ("Restarting", "restarted"),
        };
        tracing::info!("{} container: {}", doing, container);

        if let Err(e) = self.daemon.power(container, action).await {
            tracing::error!("Power action {:?} failed for {}: {}", action, container, e);
            return Err(e);
        }

        tracing::info!("Container {}: {}", done, container);
        Ok(())
    }
}
