//! Notification dispatch
//!
//! A notification is e-mailed unless its e-mail is muted, then stored unless
//! the notification itself is muted. Delivery problems are logged and leave
//! `emailed` unset.

use crate::adapters::database::traits::{NotificationQuery, NotificationStore};
use crate::adapters::mail::{EmailMessage, Mailer};
use crate::core::notifications::policy::MutePolicy;
use crate::domain::{
    AuthenticatedUser, NotificationId, NotificationType, Result, UserId, UserNotification,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Options of one [`NotificationDispatcher::send_notification`] call
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub comment: Option<String>,
    pub requestor: Option<UserId>,
    pub is_html: bool,
}

pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore + Send + Sync>,
    mailer: Arc<dyn Mailer>,
    policy: MutePolicy,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore + Send + Sync>,
        mailer: Arc<dyn Mailer>,
        policy: MutePolicy,
    ) -> Self {
        Self { store, mailer, policy }
    }

    fn email_for(user: &AuthenticatedUser, n: &UserNotification, options: &SendOptions) -> EmailMessage {
        let mut body = format!("{} notification about {}", n.notification_type, n.object_id);
        if let Some(ref comment) = options.comment {
            body.push_str("\n\n");
            body.push_str(comment);
        }
        EmailMessage {
            to: user.email.clone(),
            subject: format!("[Cairn] {}", n.notification_type),
            body,
            is_html: options.is_html,
        }
    }

    /// Builds, mails and stores a notification
    ///
    /// Returns the notification as built, `emailed` reflecting delivery,
    /// whether or not it was stored.
    ///
    /// # Errors
    ///
    /// Only when storing fails; mail failures are logged.
    pub async fn send_notification(
        &self,
        user: &AuthenticatedUser,
        send_date: DateTime<Utc>,
        notification_type: NotificationType,
        object_id: impl Into<String>,
        options: SendOptions,
    ) -> Result<UserNotification> {
        let mut notification = UserNotification::new(user.id, send_date, notification_type, object_id);
        notification.requestor_id = options.requestor;
        notification.additional_info = options.comment.clone();

        if !self.policy.is_email_muted(user, notification_type) {
            let message = Self::email_for(user, &notification, &options);
            match self.mailer.send(&message).await {
                Ok(true) => notification.emailed = true,
                Ok(false) => tracing::debug!(user_id = %user.id, "Notification e-mail was not sent"),
                Err(e) => tracing::warn!(user_id = %user.id, error = %e, "Notification e-mail failed"),
            }
        }

        if self.policy.is_notification_muted(user, notification_type) {
            tracing::debug!(user_id = %user.id, notification_type = %notification_type, "Notification muted, not stored");
            return Ok(notification);
        }
        self.store.save_notification(notification).await
    }

    pub async fn save(&self, notification: UserNotification) -> Result<UserNotification> {
        self.store.save_notification(notification).await
    }

    pub async fn delete(&self, id: &NotificationId) -> Result<()> {
        self.store.delete_notification(id).await
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        self.store.mark_read(id).await
    }

    pub async fn find(&self, id: &NotificationId) -> Result<Option<UserNotification>> {
        self.store.find_notification(id).await
    }

    pub async fn find_by_user(&self, user: UserId) -> Result<Vec<UserNotification>> {
        self.store.find_notifications(&NotificationQuery::ByUser(user)).await
    }

    pub async fn find_by_requestor(&self, requestor: UserId) -> Result<Vec<UserNotification>> {
        self.store.find_notifications(&NotificationQuery::ByRequestor(requestor)).await
    }

    pub async fn find_by_object(&self, object_id: &str) -> Result<Vec<UserNotification>> {
        self.store
            .find_notifications(&NotificationQuery::ByObject(object_id.to_string()))
            .await
    }

    pub async fn find_unread_by_user(&self, user: UserId) -> Result<Vec<UserNotification>> {
        self.store.find_notifications(&NotificationQuery::UnreadByUser(user)).await
    }

    pub async fn unread_count(&self, user: UserId) -> Result<u64> {
        self.store.unread_count(&user).await
    }

    pub async fn find_unemailed(&self) -> Result<Vec<UserNotification>> {
        self.store.find_notifications(&NotificationQuery::Unemailed).await
    }
}
