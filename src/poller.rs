use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::api::GardenApi;
use crate::panel::Panel;

/// Polls the controller's sensor endpoint on a fixed interval and writes the
/// readings into the dashboard.
pub struct Poller {
    api: Arc<dyn GardenApi>,
    panel: Arc<Mutex<Panel>>,
    interval: Duration,
}

impl Poller {
    pub fn new(api: Arc<dyn GardenApi>, panel: Arc<Mutex<Panel>>, interval: Duration) -> Self {
        Self {
            api,
            panel,
            interval,
        }
    }

    /// Tick forever. Every tick starts its own fetch, whether or not the
    /// previous one has resolved; a slow controller can make fetches overlap.
    pub async fn run(self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            ticker.tick().await;
            tokio::spawn(poll_once(Arc::clone(&self.api), Arc::clone(&self.panel)));
        }
    }
}

/// One poll cycle. A failure is logged and the cycle skipped; the next tick
/// tries again on its own.
async fn poll_once(api: Arc<dyn GardenApi>, panel: Arc<Mutex<Panel>>) {
    match api.sensor_data().await {
        Ok(snapshot) => panel.lock().await.record_snapshot(&snapshot),
        Err(e) => {
            tracing::error!(error = %e, "Sensor poll failed");
            panel.lock().await.record_poll_failure();
        }
    }
}
