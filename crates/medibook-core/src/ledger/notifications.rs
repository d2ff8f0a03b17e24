//! Append-only notification side channel.

use tracing::debug;

use super::{Ledger, LedgerError, LedgerResult};
use crate::models::{Notification, Severity};

/// Notifications, newest first.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    /// Build from records in any order.
    pub fn from_records(mut records: Vec<Notification>) -> Self {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { entries: records }
    }

    /// Prepend a notification.
    pub fn push(&mut self, notification: Notification) {
        self.entries.insert(0, notification);
    }

    pub fn all(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Ledger {
    /// Append a notification for `identity_id`.
    pub fn notify(
        &mut self,
        identity_id: &str,
        title: &str,
        message: &str,
        severity: Severity,
    ) -> Notification {
        let notification = Notification::new(
            identity_id.to_string(),
            title.to_string(),
            message.to_string(),
            severity,
        );
        debug!(
            identity_id,
            severity = severity.as_str(),
            title,
            "Notification emitted"
        );
        self.notifications.push(notification.clone());
        notification
    }

    /// Notifications addressed to `identity_id`, newest first.
    pub fn notifications_for(&self, identity_id: &str) -> Vec<&Notification> {
        self.notifications
            .all()
            .iter()
            .filter(|n| n.identity_id == identity_id)
            .collect()
    }

    pub fn unread_count(&self, identity_id: &str) -> usize {
        self.notifications
            .all()
            .iter()
            .filter(|n| n.identity_id == identity_id && !n.read)
            .count()
    }

    /// Mark one notification read. Already-read is a no-op.
    pub fn mark_read(&mut self, notification_id: &str) -> LedgerResult<()> {
        let notification = self
            .notifications
            .entries
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| LedgerError::NotificationNotFound(notification_id.to_string()))?;
        notification.read = true;
        Ok(())
    }

    /// Mark every notification of `identity_id` read; returns how many changed.
    pub fn mark_all_read(&mut self, identity_id: &str) -> usize {
        let mut changed = 0;
        for n in self
            .notifications
            .entries
            .iter_mut()
            .filter(|n| n.identity_id == identity_id && !n.read)
        {
            n.read = true;
            changed += 1;
        }
        changed
    }

    /// Whole log, newest first.
    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }
}
