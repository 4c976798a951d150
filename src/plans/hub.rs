use serde::Serialize;
use time::Date;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Change to a user's set of active plans.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivationEvent {
    Activated {
        user_id: Uuid,
        plan_id: Uuid,
        start_date: Date,
        day_count: u32,
        replaced: Vec<Uuid>,
    },
    Deactivated {
        user_id: Uuid,
        plan_id: Uuid,
    },
}

/// Fan-out of activation changes to whoever listens. Publishing with no
/// subscriber is not an error.
#[derive(Clone)]
pub struct ActivationHub {
    tx: broadcast::Sender<ActivationEvent>,
}

impl ActivationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivationEvent> {
        self.tx.subscribe()
    }

    /// Number of subscribers that received the event.
    pub fn publish(&self, event: ActivationEvent) -> usize {
        debug!(?event, "activation event");
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for ActivationHub {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Log every activation change until the hub is dropped.
pub async fn log_events(mut rx: broadcast::Receiver<ActivationEvent>) {
    loop {
        match rx.recv().await {
            Ok(ActivationEvent::Activated { user_id, plan_id, start_date, replaced, .. }) => {
                info!(%user_id, %plan_id, %start_date, replaced = replaced.len(), "plan activated");
            }
            Ok(ActivationEvent::Deactivated { user_id, plan_id }) => {
                info!(%user_id, %plan_id, "plan deactivated");
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "activation log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
