//! Production activities

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseEnumError, ValidationErrors};
use crate::record::{
    optional_enum, optional_instant, optional_text, required_instant, required_text, Record,
    RecordId,
};
use crate::time::{serialize_instant, DateForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionStatus {
    #[serde(rename = "Planifiée")]
    Planned,
    #[serde(rename = "En cours")]
    InProgress,
    #[serde(rename = "Terminée")]
    Done,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Planned => "Planifiée",
            ProductionStatus::InProgress => "En cours",
            ProductionStatus::Done => "Terminée",
        }
    }
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Planifiée" => Ok(ProductionStatus::Planned),
            "En cours" => Ok(ProductionStatus::InProgress),
            "Terminée" => Ok(ProductionStatus::Done),
            _ => Err(ParseEnumError::new("production status", s)),
        }
    }
}

/// A unit of production work. `responsible` is a free-text name, not a
/// reference to a user account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionActivity {
    pub id: RecordId,
    pub name: String,
    pub responsible: String,
    pub status: ProductionStatus,
    #[serde(serialize_with = "serialize_instant")]
    pub date: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionActivityInput {
    pub name: Option<String>,
    pub responsible: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionActivityDraft {
    pub name: String,
    pub responsible: String,
    pub status: ProductionStatus,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionActivityPatch {
    pub name: Option<String>,
    pub responsible: Option<String>,
    pub status: Option<ProductionStatus>,
    pub date: Option<DateTime<Utc>>,
}

const NAME_REQUIRED: &str = "Le nom est requis";
const RESPONSIBLE_REQUIRED: &str = "Le responsable est requis";
const STATUS_INVALID: &str = "Statut invalide (Planifiée, En cours, Terminée)";
const DATE_REQUIRED: &str = "La date est requise";
const DATE_INVALID: &str = "Date invalide";

impl Record for ProductionActivity {
    type Input = ProductionActivityInput;
    type Draft = ProductionActivityDraft;
    type Patch = ProductionActivityPatch;

    const LABEL: &'static str = "Activité de production";

    fn validate_new(input: Self::Input) -> Result<Self::Draft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", input.name, NAME_REQUIRED);
        let responsible =
            required_text(&mut errors, "responsible", input.responsible, RESPONSIBLE_REQUIRED);
        let status = optional_enum(&mut errors, "status", input.status, STATUS_INVALID);
        let date = required_instant(
            &mut errors,
            "date",
            input.date,
            DateForm::DateTime,
            DATE_REQUIRED,
            DATE_INVALID,
        );

        match (name, responsible, date) {
            (Some(name), Some(responsible), Some(date)) if errors.is_empty() => {
                Ok(ProductionActivityDraft {
                    name,
                    responsible,
                    status: status.unwrap_or(ProductionStatus::Planned),
                    date,
                })
            }
            _ => Err(errors),
        }
    }

    fn validate_patch(input: Self::Input) -> Result<Self::Patch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let patch = ProductionActivityPatch {
            name: optional_text(&mut errors, "name", input.name, NAME_REQUIRED),
            responsible: optional_text(
                &mut errors,
                "responsible",
                input.responsible,
                RESPONSIBLE_REQUIRED,
            ),
            status: optional_enum(&mut errors, "status", input.status, STATUS_INVALID),
            date: optional_instant(&mut errors, "date", input.date, DateForm::DateTime, DATE_INVALID),
        };
        errors.into_result(patch)
    }

    fn from_draft(id: RecordId, draft: Self::Draft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            responsible: draft.responsible,
            status: draft.status,
            date: draft.date,
            created_at,
        }
    }

    fn apply(&mut self, patch: Self::Patch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(responsible) = patch.responsible {
            self.responsible = responsible;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, status: Option<&str>, date: &str) -> ProductionActivityInput {
        ProductionActivityInput {
            name: Some(name.to_string()),
            responsible: Some("Ahmed Benali".to_string()),
            status: status.map(str::to_string),
            date: Some(date.to_string()),
        }
    }

    #[test]
    fn test_status_defaults_to_planned() {
        let draft = ProductionActivity::validate_new(input(
            "Extraction zone B",
            None,
            "2025-01-16T09:00:00Z",
        ))
        .unwrap();
        assert_eq!(draft.status, ProductionStatus::Planned);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let errors = ProductionActivity::validate_new(input(
            "Forage secteur B",
            Some("En attente"),
            "2025-01-17T00:00:00Z",
        ))
        .unwrap_err();
        assert!(errors.get("status").is_some());
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let errors = ProductionActivity::validate_new(ProductionActivityInput::default()).unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("responsible").is_some());
        assert!(errors.get("date").is_some());
    }

    #[test]
    fn test_patch_merges_present_fields_only() {
        let draft = ProductionActivity::validate_new(input(
            "Chargement convoyeur 3",
            Some("Planifiée"),
            "2025-01-15T08:00:00Z",
        ))
        .unwrap();
        let mut activity = ProductionActivity::from_draft(1, draft, Utc::now());

        let patch = ProductionActivity::validate_patch(ProductionActivityInput {
            status: Some("En cours".to_string()),
            ..Default::default()
        })
        .unwrap();
        activity.apply(patch);

        assert_eq!(activity.status, ProductionStatus::InProgress);
        assert_eq!(activity.name, "Chargement convoyeur 3");
    }

    #[test]
    fn test_status_serializes_with_display_string() {
        let json = serde_json::to_value(ProductionStatus::InProgress).unwrap();
        assert_eq!(json, "En cours");
    }
}
