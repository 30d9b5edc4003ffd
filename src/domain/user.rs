//! Users, callers, roles and permissions

use super::ids::{DatasetId, UserId};
use super::notification::NotificationType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    /// Login name, e.g. `@jdoe`
    pub identifier: String,
    pub email: String,
    pub superuser: bool,
    pub muted_emails: BTreeSet<NotificationType>,
    pub muted_notifications: BTreeSet<NotificationType>,
}

impl AuthenticatedUser {
    pub fn new(identifier: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            identifier: identifier.into(),
            email: email.into(),
            superuser: false,
            muted_emails: BTreeSet::new(),
            muted_notifications: BTreeSet::new(),
        }
    }

    pub fn superuser(mut self) -> Self {
        self.superuser = true;
        self
    }

    pub fn has_email_muted(&self, t: NotificationType) -> bool {
        self.muted_emails.contains(&t)
    }

    pub fn has_notification_muted(&self, t: NotificationType) -> bool {
        self.muted_notifications.contains(&t)
    }
}

/// The caller of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Guest,
    Authenticated(AuthenticatedUser),
}

impl Principal {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Principal::Authenticated(u) => Some(u),
            Principal::Guest => None,
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.user().map(|u| u.superuser).unwrap_or(false)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Guest => f.write_str(":guest"),
            Principal::Authenticated(u) => f.write_str(&u.identifier),
        }
    }
}

/// Dataset-level permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    EditDataset,
    PublishDataset,
    ViewUnpublishedDataset,
    DownloadFile,
}

/// Role granted to a user on a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Curator,
    Contributor,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Curator => "curator",
            Role::Contributor => "contributor",
            Role::Member => "member",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Curator => &[EditDataset, PublishDataset, ViewUnpublishedDataset, DownloadFile],
            Role::Contributor => &[EditDataset, ViewUnpublishedDataset, DownloadFile],
            Role::Member => &[ViewUnpublishedDataset, DownloadFile],
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "curator" => Ok(Role::Curator),
            "contributor" => Ok(Role::Contributor),
            "member" => Ok(Role::Member),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Grant of a role on one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub dataset_id: DatasetId,
    pub user_id: UserId,
    pub role: Role,
}

/// Union of the permissions carried by a set of roles
pub fn permissions_of(roles: &[Role]) -> BTreeSet<Permission> {
    roles
        .iter()
        .flat_map(|r| r.permissions().iter().copied())
        .collect()
}
