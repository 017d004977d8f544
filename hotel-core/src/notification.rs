//! Fire-and-forget notification triggers.
//!
//! Engines build a [`Notification`] after their unit of work commits and hand it
//! to [`dispatch`]. Delivery failures are logged and never surface to callers.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::access::Role;
use crate::models::NewNotification;
use crate::schema;

pub const NOTIFICATION_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    OrderStatusChanged,
    OrderAssigned,
    OrderCancelled,
    OrderRated,
    OrderPaymentUpdated,
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingCheckedIn,
    BookingCheckedOut,
    EventBooking,
    RoomStatusChanged,
    TableOccupied,
    TableCleared,
    TableMaintenance,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderPlaced => "order_placed",
            NotificationKind::OrderStatusChanged => "order_status_changed",
            NotificationKind::OrderAssigned => "order_assigned",
            NotificationKind::OrderCancelled => "order_cancelled",
            NotificationKind::OrderRated => "order_rated",
            NotificationKind::OrderPaymentUpdated => "order_payment_updated",
            NotificationKind::BookingCreated => "booking_created",
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::BookingCheckedIn => "booking_checked_in",
            NotificationKind::BookingCheckedOut => "booking_checked_out",
            NotificationKind::EventBooking => "event_booking",
            NotificationKind::RoomStatusChanged => "room_status_changed",
            NotificationKind::TableOccupied => "table_occupied",
            NotificationKind::TableCleared => "table_cleared",
            NotificationKind::TableMaintenance => "table_maintenance",
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            NotificationKind::OrderCancelled
            | NotificationKind::BookingCancelled
            | NotificationKind::OrderPlaced
            | NotificationKind::OrderAssigned
            | NotificationKind::BookingConfirmed
            | NotificationKind::TableOccupied => Priority::High,
            _ => Priority::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// Audience of a notification: everyone holding one of `roles`, plus `users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recipients {
    pub roles: Vec<Role>,
    pub users: Vec<Uuid>,
}

impl Recipients {
    pub fn roles(roles: &[Role]) -> Self {
        Recipients {
            roles: roles.to_vec(),
            users: Vec::new(),
        }
    }

    pub fn users(users: &[Uuid]) -> Self {
        Recipients {
            roles: Vec::new(),
            users: users.to_vec(),
        }
    }

    /// Adds a user when present and not already listed.
    pub fn with_user(mut self, user: Option<Uuid>) -> Self {
        if let Some(user) = user {
            if !self.users.contains(&user) {
                self.users.push(user);
            }
        }
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.users.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipients: Recipients,
    pub kind: NotificationKind,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub sender: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        recipients: Recipients,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let created_at = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            recipients,
            kind,
            priority: kind.priority(),
            title: title.into(),
            message: message.into(),
            data: Value::Object(Default::default()),
            sender: None,
            created_at,
            expires_at: created_at + Duration::days(NOTIFICATION_TTL_DAYS),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_sender(mut self, sender: Option<Uuid>) -> Self {
        self.sender = sender;
        self
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification store unavailable")]
    Unavailable,
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Hands `notification` to `notifier`, logging and discarding any failure.
pub fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if notification.recipients.is_empty() {
        tracing::debug!(kind = notification.kind.as_str(), "notification has no recipients");
        return;
    }
    if let Err(err) = notifier.notify(&notification) {
        tracing::warn!(
            kind = notification.kind.as_str(),
            error = %err,
            "failed to deliver notification"
        );
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            kind = notification.kind.as_str(),
            priority = notification.priority.as_str(),
            roles = ?notification.recipients.roles,
            users = ?notification.recipients.users,
            "{}: {}",
            notification.title,
            notification.message
        );
        Ok(())
    }
}

/// Persists notifications to the `notifications` table for later delivery.
pub struct OutboxNotifier {
    conn: Mutex<PgConnection>,
}

impl OutboxNotifier {
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut conn = self.conn.lock().map_err(|_| NotifyError::Unavailable)?;
        diesel::insert_into(schema::notifications::table)
            .values(NewNotification {
                id: notification.id,
                recipient_roles: notification
                    .recipients
                    .roles
                    .iter()
                    .map(|r| r.as_str().to_string())
                    .collect(),
                recipient_users: notification.recipients.users.clone(),
                kind: notification.kind.as_str().to_string(),
                priority: notification.priority.as_str().to_string(),
                title: notification.title.clone(),
                message: notification.message.clone(),
                data: notification.data.clone(),
                sender_id: notification.sender,
                created_at: notification.created_at,
                expires_at: notification.expires_at,
            })
            .execute(&mut *conn)?;
        Ok(())
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent().iter().map(|n| n.kind).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Unavailable)?
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenNotifier;

    impl Notifier for BrokenNotifier {
        fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Unavailable)
        }
    }

    #[test]
    fn test_priority_follows_kind() {
        assert_eq!(NotificationKind::OrderCancelled.priority(), Priority::High);
        assert_eq!(NotificationKind::OrderPlaced.priority(), Priority::High);
        assert_eq!(NotificationKind::OrderRated.priority(), Priority::Normal);
        assert_eq!(NotificationKind::BookingCreated.priority(), Priority::Normal);
    }

    #[test]
    fn test_expires_after_thirty_days() {
        let n = Notification::new(
            NotificationKind::OrderPlaced,
            Recipients::roles(&[Role::Admin]),
            "New order",
            "Order ORD-1 placed",
        );
        assert_eq!(n.expires_at - n.created_at, Duration::days(30));
    }

    #[test]
    fn test_recipients_dedup_users() {
        let user = Uuid::new_v4();
        let r = Recipients::roles(&[Role::Admin])
            .with_user(Some(user))
            .with_user(Some(user))
            .with_user(None)
            .with_role(Role::Admin);
        assert_eq!(r.users, vec![user]);
        assert_eq!(r.roles, vec![Role::Admin]);
    }

    #[test]
    fn test_dispatch_swallows_failures() {
        dispatch(
            &BrokenNotifier,
            Notification::new(
                NotificationKind::OrderRated,
                Recipients::roles(&[Role::Admin]),
                "Rated",
                "Order rated",
            ),
        );
    }

    #[test]
    fn test_dispatch_skips_empty_audience() {
        let recorder = RecordingNotifier::new();
        dispatch(
            &recorder,
            Notification::new(
                NotificationKind::OrderStatusChanged,
                Recipients::default(),
                "Status",
                "changed",
            ),
        );
        assert!(recorder.sent().is_empty());
    }
}
