//! Security alerts

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseEnumError, ValidationErrors};
use crate::record::{optional_enum, optional_text, required_enum, required_text, Record, RecordId};
use crate::time::serialize_instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(ParseEnumError::new("severity", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    pub zone: String,
    pub message: String,
    pub severity: Severity,
    pub resolved: bool,
    #[serde(serialize_with = "serialize_instant")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlertInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub zone: Option<String>,
    pub message: Option<String>,
    pub severity: Option<String>,
    pub resolved: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityAlertDraft {
    pub kind: String,
    pub zone: String,
    pub message: String,
    pub severity: Severity,
    pub resolved: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityAlertPatch {
    pub kind: Option<String>,
    pub zone: Option<String>,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub resolved: Option<bool>,
}

const TYPE_REQUIRED: &str = "Le type d'alerte est requis";
const ZONE_REQUIRED: &str = "La zone est requise";
const MESSAGE_REQUIRED: &str = "Le message est requis";
const SEVERITY_REQUIRED: &str = "La gravité est requise";
const SEVERITY_INVALID: &str = "Gravité invalide (low, medium, high)";

impl Record for SecurityAlert {
    type Input = SecurityAlertInput;
    type Draft = SecurityAlertDraft;
    type Patch = SecurityAlertPatch;

    const LABEL: &'static str = "Alerte de sécurité";

    fn validate_new(input: Self::Input) -> Result<Self::Draft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let kind = required_text(&mut errors, "type", input.kind, TYPE_REQUIRED);
        let zone = required_text(&mut errors, "zone", input.zone, ZONE_REQUIRED);
        let message = required_text(&mut errors, "message", input.message, MESSAGE_REQUIRED);
        let severity = required_enum(
            &mut errors,
            "severity",
            input.severity,
            SEVERITY_REQUIRED,
            SEVERITY_INVALID,
        );

        match (kind, zone, message, severity) {
            (Some(kind), Some(zone), Some(message), Some(severity)) if errors.is_empty() => {
                Ok(SecurityAlertDraft {
                    kind,
                    zone,
                    message,
                    severity,
                    resolved: input.resolved.unwrap_or(false),
                })
            }
            _ => Err(errors),
        }
    }

    fn validate_patch(input: Self::Input) -> Result<Self::Patch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let patch = SecurityAlertPatch {
            kind: optional_text(&mut errors, "type", input.kind, TYPE_REQUIRED),
            zone: optional_text(&mut errors, "zone", input.zone, ZONE_REQUIRED),
            message: optional_text(&mut errors, "message", input.message, MESSAGE_REQUIRED),
            severity: optional_enum(&mut errors, "severity", input.severity, SEVERITY_INVALID),
            resolved: input.resolved,
        };
        errors.into_result(patch)
    }

    fn from_draft(id: RecordId, draft: Self::Draft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: draft.kind,
            zone: draft.zone,
            message: draft.message,
            severity: draft.severity,
            resolved: draft.resolved,
            created_at,
        }
    }

    fn apply(&mut self, patch: Self::Patch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(zone) = patch.zone {
            self.zone = zone;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(severity) = patch.severity {
            self.severity = severity;
        }
        if let Some(resolved) = patch.resolved {
            self.resolved = resolved;
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }
}
