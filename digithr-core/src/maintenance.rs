//! Maintenance work orders
//!
//! `scheduledDate` accepts a bare `YYYY-MM-DD`, which is stored as midnight
//! UTC of that day. The dashboard's date picker sends that form.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseEnumError, ValidationErrors};
use crate::record::{
    optional_enum, optional_instant, optional_text, required_enum, required_instant,
    required_text, Record, RecordId,
};
use crate::time::{serialize_instant, DateForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceType {
    #[serde(rename = "Préventive")]
    Preventive,
    #[serde(rename = "Corrective")]
    Corrective,
    #[serde(rename = "Urgente")]
    Urgent,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceType::Preventive => "Préventive",
            MaintenanceType::Corrective => "Corrective",
            MaintenanceType::Urgent => "Urgente",
        }
    }
}

impl fmt::Display for MaintenanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Préventive" => Ok(MaintenanceType::Preventive),
            "Corrective" => Ok(MaintenanceType::Corrective),
            "Urgente" => Ok(MaintenanceType::Urgent),
            _ => Err(ParseEnumError::new("maintenance type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    #[serde(rename = "Planifiée")]
    Planned,
    #[serde(rename = "En cours")]
    InProgress,
    #[serde(rename = "Terminée")]
    Done,
    #[serde(rename = "Reportée")]
    Postponed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Planned => "Planifiée",
            MaintenanceStatus::InProgress => "En cours",
            MaintenanceStatus::Done => "Terminée",
            MaintenanceStatus::Postponed => "Reportée",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Planifiée" => Ok(MaintenanceStatus::Planned),
            "En cours" => Ok(MaintenanceStatus::InProgress),
            "Terminée" => Ok(MaintenanceStatus::Done),
            "Reportée" => Ok(MaintenanceStatus::Postponed),
            _ => Err(ParseEnumError::new("maintenance status", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSchedule {
    pub id: RecordId,
    pub machine: String,
    #[serde(rename = "type")]
    pub kind: MaintenanceType,
    pub description: String,
    #[serde(serialize_with = "serialize_instant")]
    pub scheduled_date: DateTime<Utc>,
    pub status: MaintenanceStatus,
    #[serde(serialize_with = "serialize_instant")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceScheduleInput {
    pub machine: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub scheduled_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceScheduleDraft {
    pub machine: String,
    pub kind: MaintenanceType,
    pub description: String,
    pub scheduled_date: DateTime<Utc>,
    pub status: MaintenanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceSchedulePatch {
    pub machine: Option<String>,
    pub kind: Option<MaintenanceType>,
    pub description: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: Option<MaintenanceStatus>,
}

const MACHINE_REQUIRED: &str = "Le nom de la machine est requis";
const TYPE_REQUIRED: &str = "Le type de maintenance est requis";
const TYPE_INVALID: &str = "Type invalide (Préventive, Corrective, Urgente)";
const DESCRIPTION_REQUIRED: &str = "La description est requise";
const DATE_REQUIRED: &str = "La date planifiée est requise";
const DATE_INVALID: &str = "Date planifiée invalide";
const STATUS_INVALID: &str = "Statut invalide (Planifiée, En cours, Terminée, Reportée)";

impl Record for MaintenanceSchedule {
    type Input = MaintenanceScheduleInput;
    type Draft = MaintenanceScheduleDraft;
    type Patch = MaintenanceSchedulePatch;

    const LABEL: &'static str = "Planning de maintenance";

    fn validate_new(input: Self::Input) -> Result<Self::Draft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let machine = required_text(&mut errors, "machine", input.machine, MACHINE_REQUIRED);
        let kind = required_enum(&mut errors, "type", input.kind, TYPE_REQUIRED, TYPE_INVALID);
        let description =
            required_text(&mut errors, "description", input.description, DESCRIPTION_REQUIRED);
        let scheduled_date = required_instant(
            &mut errors,
            "scheduledDate",
            input.scheduled_date,
            DateForm::DateOrDateTime,
            DATE_REQUIRED,
            DATE_INVALID,
        );
        let status = optional_enum(&mut errors, "status", input.status, STATUS_INVALID);

        match (machine, kind, description, scheduled_date) {
            (Some(machine), Some(kind), Some(description), Some(scheduled_date))
                if errors.is_empty() =>
            {
                Ok(MaintenanceScheduleDraft {
                    machine,
                    kind,
                    description,
                    scheduled_date,
                    status: status.unwrap_or(MaintenanceStatus::Planned),
                })
            }
            _ => Err(errors),
        }
    }

    fn validate_patch(input: Self::Input) -> Result<Self::Patch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let patch = MaintenanceSchedulePatch {
            machine: optional_text(&mut errors, "machine", input.machine, MACHINE_REQUIRED),
            kind: optional_enum(&mut errors, "type", input.kind, TYPE_INVALID),
            description: optional_text(
                &mut errors,
                "description",
                input.description,
                DESCRIPTION_REQUIRED,
            ),
            scheduled_date: optional_instant(
                &mut errors,
                "scheduledDate",
                input.scheduled_date,
                DateForm::DateOrDateTime,
                DATE_INVALID,
            ),
            status: optional_enum(&mut errors, "status", input.status, STATUS_INVALID),
        };
        errors.into_result(patch)
    }

    fn from_draft(id: RecordId, draft: Self::Draft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            machine: draft.machine,
            kind: draft.kind,
            description: draft.description,
            scheduled_date: draft.scheduled_date,
            status: draft.status,
            created_at,
        }
    }

    fn apply(&mut self, patch: Self::Patch) {
        if let Some(machine) = patch.machine {
            self.machine = machine;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(scheduled_date) = patch.scheduled_date {
            self.scheduled_date = scheduled_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::format_instant;

    fn input(kind: &str, scheduled_date: &str) -> MaintenanceScheduleInput {
        MaintenanceScheduleInput {
            machine: Some("Excavatrice CAT 320".to_string()),
            kind: Some(kind.to_string()),
            description: Some("Révision générale".to_string()),
            scheduled_date: Some(scheduled_date.to_string()),
            status: None,
        }
    }

    #[test]
    fn test_bare_date_normalized_to_midnight_utc() {
        let draft = MaintenanceSchedule::validate_new(input("Préventive", "2025-03-10")).unwrap();
        assert_eq!(format_instant(&draft.scheduled_date), "2025-03-10T00:00:00.000Z");
        assert_eq!(draft.status, MaintenanceStatus::Planned);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let errors = MaintenanceSchedule::validate_new(input("Cosmétique", "2025-03-10")).unwrap_err();
        assert_eq!(errors.get("type"), Some(TYPE_INVALID));
    }

    #[test]
    fn test_missing_type_reported() {
        let mut body = input("Corrective", "2025-03-10");
        body.kind = None;
        let errors = MaintenanceSchedule::validate_new(body).unwrap_err();
        assert_eq!(errors.get("type"), Some(TYPE_REQUIRED));
    }

    #[test]
    fn test_unparseable_date_rejected() {
        let errors = MaintenanceSchedule::validate_new(input("Urgente", "10/03/2025")).unwrap_err();
        assert!(errors.get("scheduledDate").is_some());
    }

    #[test]
    fn test_patch_validates_status() {
        let errors = MaintenanceSchedule::validate_patch(MaintenanceScheduleInput {
            status: Some("Annulée".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(errors.get("status").is_some());

        let patch = MaintenanceSchedule::validate_patch(MaintenanceScheduleInput {
            status: Some("Reportée".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.status, Some(MaintenanceStatus::Postponed));
    }

    #[test]
    fn test_type_field_named_type_on_the_wire() {
        let draft = MaintenanceSchedule::validate_new(input("Urgente", "2025-03-10")).unwrap();
        let schedule = MaintenanceSchedule::from_draft(3, draft, Utc::now());
        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["type"], "Urgente");
        assert_eq!(json["scheduledDate"], "2025-03-10T00:00:00.000Z");
        assert_eq!(json["status"], "Planifiée");
    }
}
