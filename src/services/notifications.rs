//! Ephemeral queue of user-facing event messages.
//!
//! Entries are independent and may coexist; the presentation layer owns
//! display timing and calls [`NotificationQueue::remove`] when an entry's
//! display lifetime ends. The whole queue is cleared on every
//! navigation/view change via [`NotificationQueue::clear`].

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::models::notification::{Notification, Severity};

#[derive(Debug, Default)]
pub struct NotificationQueue {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification and return its freshly assigned id.
    pub fn push(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            severity,
            created_at: Utc::now(),
        };
        let id = notification.id;
        tracing::debug!(%id, severity = %severity, title = %notification.title, "notification pushed");
        self.entries.lock().unwrap().push(notification);
        id
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(title, message, Severity::Info)
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(title, message, Severity::Success)
    }

    pub fn danger(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(title, message, Severity::Danger)
    }

    /// Remove one entry; removing an unknown id is a no-op.
    pub fn remove(&self, id: Uuid) {
        self.entries.lock().unwrap().retain(|n| n.id != id);
    }

    /// Drop every entry regardless of remaining display time. Invoked on
    /// each navigation/view-change event.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn list(&self) -> Vec<Notification> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_at_the_tail_with_unique_ids() {
        let queue = NotificationQueue::new();
        let first = queue.info("Upload", "started");
        let second = queue.success("Upload", "finished");
        assert_ne!(first, second);

        let entries = queue.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].id, second);
        assert_eq!(entries[1].severity, Severity::Success);
    }

    #[test]
    fn remove_is_a_noop_for_unknown_ids() {
        let queue = NotificationQueue::new();
        let id = queue.danger("Error", "analysis failed");
        queue.remove(Uuid::new_v4());
        assert_eq!(queue.len(), 1);
        queue.remove(id);
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_empties_the_queue_unconditionally() {
        let queue = NotificationQueue::new();
        queue.info("a", "1");
        queue.success("b", "2");
        queue.danger("c", "3");
        queue.clear();
        assert!(queue.is_empty());
        // Clearing an already-empty queue is fine.
        queue.clear();
        assert!(queue.is_empty());
    }
}
