//! Bootstrap data for a fresh installation

use digithr_core::alert::SecurityAlertInput;
use digithr_core::maintenance::MaintenanceScheduleInput;
use digithr_core::notification::NotificationInput;
use digithr_core::production::ProductionActivityInput;
use digithr_core::user::NewUser;
use digithr_core::{Record, Role};

use crate::crypto::hash_password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Repository, SessionStore, UserStore};

struct SeedAccount {
    username: &'static str,
    password: &'static str,
    name: &'static str,
    email: &'static str,
    role: Role,
    department: &'static str,
}

const ACCOUNTS: &[SeedAccount] = &[
    SeedAccount {
        username: "admin",
        password: "admin123",
        name: "Administrateur",
        email: "admin@digithr.ma",
        role: Role::Admin,
        department: "Direction",
    },
    SeedAccount {
        username: "abdelfattah",
        password: "abdelfattah ocp",
        name: "Abdelfattah",
        email: "abdelfattah@ocp.ma",
        role: Role::Superviseur,
        department: "Production",
    },
    SeedAccount {
        username: "securite",
        password: "securite123",
        name: "Agent Sécurité",
        email: "securite@digithr.ma",
        role: Role::AgentSecurite,
        department: "Sécurité",
    },
];

fn s(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// Insert the sample accounts and records when no user exists yet.
/// Returns whether anything was inserted.
pub fn seed_defaults<U, S>(state: &AppState<U, S>) -> Result<bool, ApiError>
where
    U: UserStore,
    S: SessionStore,
{
    if state.user_store.count_users()? > 0 {
        tracing::debug!("Users present, skipping seed");
        return Ok(false);
    }

    for account in ACCOUNTS {
        state.user_store.create_user(NewUser {
            username: account.username.to_string(),
            password_hash: hash_password(account.password, state.settings.bcrypt_cost)?,
            name: account.name.to_string(),
            email: s(account.email),
            role: account.role,
            department: s(account.department),
            is_active: true,
            created_by: None,
        })?;
    }

    let repos = &state.repositories;
    let production = [
        ("Extraction Zone A", "Ahmed Benali", "En cours", "2025-01-16T08:00:00Z"),
        ("Transport matériaux", "Fatima Zahra", "Terminée", "2025-01-15T08:00:00Z"),
        ("Forage secteur B", "Mohamed Alaoui", "Planifiée", "2025-01-17T08:00:00Z"),
    ];
    for (name, responsible, status, date) in production {
        insert(
            repos.production.as_ref(),
            ProductionActivityInput {
                name: s(name),
                responsible: s(responsible),
                status: s(status),
                date: s(date),
            },
        )?;
    }

    let maintenance = [
        ("Excavatrice CAT 320", "Préventive", "Vérification hydraulique et changement filtres", "2025-01-18"),
        ("Camion Volvo FH16", "Corrective", "Réparation système de freinage", "2025-01-16"),
        ("Chargeuse Liebherr", "Préventive", "Entretien moteur et vérification pneumatiques", "2025-01-20"),
    ];
    for (machine, kind, description, date) in maintenance {
        insert(
            repos.maintenance.as_ref(),
            MaintenanceScheduleInput {
                machine: s(machine),
                kind: s(kind),
                description: s(description),
                scheduled_date: s(date),
                status: None,
            },
        )?;
    }

    let alerts = [
        ("Accès non autorisé", "Zone A", "Détection d'un accès non autorisé en Zone A", "high", false),
        ("Équipement défaillant", "Zone B", "Capteur de température hors service - Poste 7", "medium", true),
        ("Personnel sans EPI", "Zone C", "Ouvrier détecté sans casque de sécurité", "high", false),
    ];
    for (kind, zone, message, severity, resolved) in alerts {
        insert(
            repos.alerts.as_ref(),
            SecurityAlertInput {
                kind: s(kind),
                zone: s(zone),
                message: s(message),
                severity: s(severity),
                resolved: Some(resolved),
            },
        )?;
    }

    let notifications = [
        ("Alerte Sécurité", "Nouvelle alerte de sécurité dans la Zone A", "error", false),
        ("Maintenance Programmée", "Maintenance de l'excavatrice CAT 320 prévue demain", "info", false),
        ("Production Terminée", "Transport matériaux terminé avec succès", "success", true),
    ];
    for (title, message, kind, read) in notifications {
        insert(
            repos.notifications.as_ref(),
            NotificationInput {
                title: s(title),
                message: s(message),
                kind: s(kind),
                read: Some(read),
            },
        )?;
    }

    tracing::info!(
        users = ACCOUNTS.len(),
        "Seeded sample accounts and records"
    );
    Ok(true)
}

fn insert<T: Record>(repo: &dyn Repository<T>, input: T::Input) -> Result<T, ApiError> {
    let draft = T::validate_new(input)?;
    repo.insert(draft)
}

#[cfg(test)]
mod tests {
    use tower_cookies::Key;

    use super::*;
    use crate::state::Settings;
    use crate::store::{InMemorySessionStore, InMemoryUserStore, Repositories};

    fn test_state() -> AppState<InMemoryUserStore, InMemorySessionStore> {
        AppState::new(
            InMemoryUserStore::new(),
            InMemorySessionStore::new(),
            Repositories::in_memory(),
            Key::generate(),
            Settings {
                bcrypt_cost: 4,
                ..Settings::default()
            },
        )
    }

    #[test]
    fn test_seed_populates_empty_store() {
        let state = test_state();
        assert!(seed_defaults(&state).unwrap());

        let admin = state.user_store.get_user_by_username("admin").unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(state.repositories.production.list().unwrap().len(), 3);
        assert_eq!(state.repositories.maintenance.list().unwrap().len(), 3);
        let alerts = state.repositories.alerts.list().unwrap();
        assert_eq!(alerts.iter().filter(|a| !a.resolved).count(), 2);
        assert_eq!(state.repositories.notifications.list().unwrap().len(), 3);
    }

    #[test]
    fn test_seed_is_skipped_when_users_exist() {
        let state = test_state();
        assert!(seed_defaults(&state).unwrap());
        assert!(!seed_defaults(&state).unwrap());
        assert_eq!(state.user_store.count_users().unwrap(), 3);
        assert_eq!(state.repositories.production.list().unwrap().len(), 3);
    }
}
