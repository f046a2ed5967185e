//! Processing stages ("places") run by agents.

use crate::pipeline::item::WorkItem;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A processing stage that work items are routed to by their current form.
#[async_trait]
pub trait Place: Send + Sync {
    /// Key recorded in transform history, e.g. `DELAY.ID.http://host:8001/DelayPlace`.
    fn key(&self) -> &str;

    /// Forms this place registers for.
    fn forms(&self) -> Vec<String>;

    /// Processes `item` in place. Returned items are children sprouted by
    /// this stage; the agent derives lineage for them before requeueing.
    async fn process(&self, item: &mut WorkItem) -> Result<Vec<WorkItem>>;
}

pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// Sink for everything it registers for, after a fixed delay.
pub struct DelayPlace {
    key: String,
    forms: Vec<String>,
    delay: Duration,
}

impl DelayPlace {
    pub fn new(key: impl Into<String>, forms: Vec<String>, delay: Duration) -> Self {
        Self {
            key: key.into(),
            forms,
            delay,
        }
    }

    /// Reads the delay from `DELAY_TIME_MILLIS`, falling back to the default.
    pub fn delay_from_env() -> Duration {
        match std::env::var("DELAY_TIME_MILLIS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    tracing::warn!("Ignoring DELAY_TIME_MILLIS={}: {}", raw, e);
                    DEFAULT_DELAY
                }
            },
            Err(_) => DEFAULT_DELAY,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Place for DelayPlace {
    fn key(&self) -> &str {
        &self.key
    }

    fn forms(&self) -> Vec<String> {
        self.forms.clone()
    }

    async fn process(&self, item: &mut WorkItem) -> Result<Vec<WorkItem>> {
        tracing::debug!("Delay starting {:?}", item.all_current_forms());
        tokio::time::sleep(self.delay).await;
        tracing::debug!("Delay ended {:?}", item.all_current_forms());
        Ok(Vec::new())
    }
}
