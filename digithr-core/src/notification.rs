//! User-facing notifications

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseEnumError, ValidationErrors};
use crate::record::{optional_enum, optional_text, required_enum, required_text, Record, RecordId};
use crate::time::serialize_instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Info => "info",
            NotificationType::Warning => "warning",
            NotificationType::Error => "error",
            NotificationType::Success => "success",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(NotificationType::Info),
            "warning" => Ok(NotificationType::Warning),
            "error" => Ok(NotificationType::Error),
            "success" => Ok(NotificationType::Success),
            _ => Err(ParseEnumError::new("notification type", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: RecordId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    #[serde(serialize_with = "serialize_instant")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInput {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub read: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub read: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPatch {
    pub title: Option<String>,
    pub message: Option<String>,
    pub kind: Option<NotificationType>,
    pub read: Option<bool>,
}

const TITLE_REQUIRED: &str = "Le titre est requis";
const MESSAGE_REQUIRED: &str = "Le message est requis";
const TYPE_REQUIRED: &str = "Le type de notification est requis";
const TYPE_INVALID: &str = "Type invalide (info, warning, error, success)";

impl Record for Notification {
    type Input = NotificationInput;
    type Draft = NotificationDraft;
    type Patch = NotificationPatch;

    const LABEL: &'static str = "Notification";

    fn validate_new(input: Self::Input) -> Result<Self::Draft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = required_text(&mut errors, "title", input.title, TITLE_REQUIRED);
        let message = required_text(&mut errors, "message", input.message, MESSAGE_REQUIRED);
        let kind = required_enum(&mut errors, "type", input.kind, TYPE_REQUIRED, TYPE_INVALID);

        match (title, message, kind) {
            (Some(title), Some(message), Some(kind)) if errors.is_empty() => Ok(NotificationDraft {
                title,
                message,
                kind,
                read: input.read.unwrap_or(false),
            }),
            _ => Err(errors),
        }
    }

    fn validate_patch(input: Self::Input) -> Result<Self::Patch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let patch = NotificationPatch {
            title: optional_text(&mut errors, "title", input.title, TITLE_REQUIRED),
            message: optional_text(&mut errors, "message", input.message, MESSAGE_REQUIRED),
            kind: optional_enum(&mut errors, "type", input.kind, TYPE_INVALID),
            read: input.read,
        };
        errors.into_result(patch)
    }

    fn from_draft(id: RecordId, draft: Self::Draft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            read: draft.read,
            created_at,
        }
    }

    fn apply(&mut self, patch: Self::Patch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(read) = patch.read {
            self.read = read;
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }
}
