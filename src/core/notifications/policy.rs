//! Installation-wide mute policy
//!
//! `always` mutes a type for everyone; `never` overrides users' own mute
//! preferences. A type listed in both is muted.

use crate::config::NotificationConfig;
use crate::domain::{AuthenticatedUser, NotificationType};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutePolicy {
    always: BTreeSet<NotificationType>,
    never: BTreeSet<NotificationType>,
}

impl MutePolicy {
    pub fn new(
        always: impl IntoIterator<Item = NotificationType>,
        never: impl IntoIterator<Item = NotificationType>,
    ) -> Self {
        Self {
            always: always.into_iter().collect(),
            never: never.into_iter().collect(),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.always_muted_types(), config.never_muted_types())
    }

    fn settled(&self, t: NotificationType, user_muted: bool, what: &str) -> bool {
        let always = self.always.contains(&t);
        let never = self.never.contains(&t);
        if always && never {
            tracing::warn!(
                notification_type = %t,
                "Type is both always and never muted, {} is muted",
                what
            );
        }
        always || (!never && user_muted)
    }

    pub fn is_email_muted(&self, user: &AuthenticatedUser, t: NotificationType) -> bool {
        self.settled(t, user.has_email_muted(t), "email")
    }

    pub fn is_notification_muted(&self, user: &AuthenticatedUser, t: NotificationType) -> bool {
        self.settled(t, user.has_notification_muted(t), "notification")
    }
}
