use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::gateway::{ApiGateway, GatewayError};
use crate::services::history::HistoryStore;
use crate::services::notifications::NotificationQueue;
use crate::services::tracker::JobTracker;

/// Shared application context, constructed once at process start and passed
/// by reference to whichever component needs it.
pub struct AppContext {
    pub gateway: Arc<ApiGateway>,
    pub history: Arc<HistoryStore>,
    pub notifications: Arc<NotificationQueue>,
    pub tracker: JobTracker,
}

impl AppContext {
    pub fn new(config: &AppConfig) -> Result<Self, GatewayError> {
        let gateway = Arc::new(ApiGateway::new(
            config.api_base_url.clone(),
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?);
        let history = Arc::new(HistoryStore::load(config.history_path.clone()));
        let notifications = Arc::new(NotificationQueue::new());
        let tracker = JobTracker::new(
            Arc::clone(&gateway),
            Arc::clone(&history),
            Arc::clone(&notifications),
            Duration::from_millis(config.poll_interval_ms),
        );
        Ok(Self {
            gateway,
            history,
            notifications,
            tracker,
        })
    }

    /// Navigation/view-change hook: every pending notification is dropped,
    /// regardless of remaining display time.
    pub fn on_view_change(&self) {
        self.notifications.clear();
    }

    /// Pull the backend's result history and merge it into the local store.
    ///
    /// Returns the number of newly recorded entries. The backend serves
    /// most-recent-first; entries are added oldest-first so head-insert
    /// keeps that ordering locally. A fetch failure is surfaced and also
    /// pushed as a `danger` notification.
    pub async fn refresh_history(&self) -> Result<usize, GatewayError> {
        let results = match self.gateway.history().await {
            Ok(results) => results,
            Err(e) => {
                self.notifications.danger("History Unavailable", e.to_string());
                return Err(e);
            }
        };
        let mut added = 0;
        for result in results.into_iter().rev() {
            if self.history.add(result) {
                added += 1;
            }
        }
        if added > 0 {
            tracing::info!(added, "merged backend history into local store");
        }
        Ok(added)
    }
}
