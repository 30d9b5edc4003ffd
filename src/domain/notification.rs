//! User notifications

use super::ids::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! notification_types {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Kind of event a notification reports
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NotificationType {
            $($variant),+
        }

        impl NotificationType {
            pub const ALL: &'static [NotificationType] = &[$(NotificationType::$variant),+];

            /// Canonical upper-case name used in settings and storage
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(NotificationType::$variant => $name),+
                }
            }
        }
    };
}

notification_types! {
    AssignRole => "ASSIGNROLE",
    RevokeRole => "REVOKEROLE",
    CreateDataset => "CREATEDS",
    CreateAccount => "CREATEACC",
    SubmittedDataset => "SUBMITTEDDS",
    ReturnedDataset => "RETURNEDDS",
    PublishedDataset => "PUBLISHEDDS",
    RequestFileAccess => "REQUESTFILEACCESS",
    GrantFileAccess => "GRANTFILEACCESS",
    RejectFileAccess => "REJECTFILEACCESS",
    ChecksumFail => "CHECKSUMFAIL",
    IngestCompleted => "INGESTCOMPLETED",
    IngestCompletedWithErrors => "INGESTCOMPLETEDWITHERRORS",
    PublishFailedPidReg => "PUBLISHFAILED_PIDREG",
    WorkflowSuccess => "WORKFLOW_SUCCESS",
    WorkflowFailure => "WORKFLOW_FAILURE",
    StatusUpdated => "STATUSUPDATED",
    DatasetMentioned => "DATASETMENTIONED",
    GlobusUploadCompleted => "GLOBUSUPLOADCOMPLETED",
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        NotificationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown notification type: {wanted}"))
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A notification addressed to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub send_date: DateTime<Utc>,
    pub notification_type: NotificationType,
    /// Entity the notification is about (dataset, file, collection...)
    pub object_id: String,
    pub requestor_id: Option<UserId>,
    pub read: bool,
    pub emailed: bool,
    pub additional_info: Option<String>,
}

impl UserNotification {
    pub fn new(
        user_id: UserId,
        send_date: DateTime<Utc>,
        notification_type: NotificationType,
        object_id: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            send_date,
            notification_type,
            object_id: object_id.into(),
            requestor_id: None,
            read: false,
            emailed: false,
            additional_info: None,
        }
    }
}

/// Parses a comma-separated list of notification type names, skipping blanks
///
/// # Errors
///
/// Returns the first unknown name
pub fn parse_type_list(list: &str) -> Result<Vec<NotificationType>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(NotificationType::PublishFailedPidReg.to_string(), "PUBLISHFAILED_PIDREG");
        assert_eq!(
            "ingestcompleted".parse::<NotificationType>().unwrap(),
            NotificationType::IngestCompleted
        );
        assert!("PARTY".parse::<NotificationType>().is_err());
    }

    #[test]
    fn test_type_serialization() {
        let json = serde_json::to_string(&NotificationType::AssignRole).unwrap();
        assert_eq!(json, "\"ASSIGNROLE\"");
        let back: NotificationType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NotificationType::AssignRole);
    }

    #[test]
    fn test_parse_type_list() {
        let types = parse_type_list("ASSIGNROLE, revokerole,,").unwrap();
        assert_eq!(types, vec![NotificationType::AssignRole, NotificationType::RevokeRole]);
        assert!(parse_type_list("ASSIGNROLE,NOPE").is_err());
        assert!(parse_type_list("").unwrap().is_empty());
    }

    #[test]
    fn test_new_notification_is_unread() {
        let n = UserNotification::new(UserId::new(), Utc::now(), NotificationType::CreateDataset, "42");
        assert!(!n.read);
        assert!(!n.emailed);
    }
}
