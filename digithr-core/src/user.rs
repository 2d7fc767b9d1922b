//! User accounts: wire shape, input validation and the deletion rule
//!
//! Password hashing lives in the server; this module only decides whether a
//! plaintext password is acceptable and whether one must be generated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationErrors;
use crate::role::Role;
use crate::time::{serialize_instant, serialize_optional_instant};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 8;
/// bcrypt ignores input past 72 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Role given to accounts created without one.
pub const DEFAULT_ROLE: Role = Role::AgentSecurite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored account. The password hash never serializes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub is_active: bool,
    #[serde(serialize_with = "serialize_optional_instant")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_instant")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Insert payload for a credential store. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_by: Option<UserId>,
}

/// Partial update for a credential store.
///
/// For `email` and `department`, `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub role: Option<Role>,
    pub department: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(department) = self.department {
            user.department = department;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

/// A validated creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub username: String,
    /// `None` when the caller gave no usable password and one must be
    /// generated.
    pub password: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub is_active: bool,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<UserDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = match self.username.map(|u| u.trim().to_string()) {
            Some(u) if u.is_empty() => {
                errors.add("username", "Le nom d'utilisateur est requis");
                None
            }
            Some(u) => check_username(&mut errors, u),
            None => {
                errors.add("username", "Le nom d'utilisateur est requis");
                None
            }
        };

        let name = match self.name {
            Some(name) => check_name(&mut errors, name),
            None => {
                errors.add("name", "Le nom est requis");
                None
            }
        };

        // A short or missing password is replaced by a generated one.
        let password = match self.password {
            Some(p) if p.chars().count() >= PASSWORD_MIN => {
                if p.len() > PASSWORD_MAX_BYTES {
                    errors.add("password", too_long_password());
                    None
                } else {
                    Some(p)
                }
            }
            _ => None,
        };

        let role = match self.role {
            Some(role) => parse_role(&mut errors, &role),
            None => Some(DEFAULT_ROLE),
        };

        let email = self.email.and_then(|e| check_email(&mut errors, e));
        let department = self.department.and_then(non_blank);

        match (username, name, role) {
            (Some(username), Some(name), Some(role)) if errors.is_empty() => Ok(UserDraft {
                username,
                password,
                name,
                email,
                role,
                department,
                is_active: self.is_active.unwrap_or(true),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// A validated partial update. `password` is still plaintext.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub role: Option<Role>,
    pub department: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.and_then(|n| check_name(&mut errors, n));
        let role = self.role.and_then(|r| parse_role(&mut errors, &r));

        // An empty string clears the optional columns.
        let email = self.email.map(|e| {
            if e.trim().is_empty() {
                None
            } else {
                check_email(&mut errors, e)
            }
        });
        let department = self.department.map(non_blank);

        // Password is only applied when non-empty.
        let password = match self.password {
            Some(p) if p.is_empty() => None,
            Some(p) => match check_password(&p) {
                Ok(()) => Some(p),
                Err(message) => {
                    errors.add("password", message);
                    None
                }
            },
            None => None,
        };

        errors.into_result(UserUpdate {
            name,
            email,
            role,
            department,
            is_active: self.is_active,
            password,
        })
    }
}

/// Check a plaintext password against the length policy.
pub fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(format!(
            "Le mot de passe doit contenir au moins {PASSWORD_MIN} caractères"
        ));
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(too_long_password());
    }
    Ok(())
}

fn too_long_password() -> String {
    format!("Le mot de passe ne doit pas dépasser {PASSWORD_MAX_BYTES} octets")
}

fn check_username(errors: &mut ValidationErrors, username: String) -> Option<String> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        errors.add(
            "username",
            format!(
                "Le nom d'utilisateur doit contenir entre {USERNAME_MIN} et {USERNAME_MAX} caractères"
            ),
        );
        return None;
    }
    Some(username)
}

fn check_name(errors: &mut ValidationErrors, name: String) -> Option<String> {
    let name = name.trim().to_string();
    let len = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        errors.add(
            "name",
            format!("Le nom doit contenir entre {NAME_MIN} et {NAME_MAX} caractères"),
        );
        return None;
    }
    Some(name)
}

fn check_email(errors: &mut ValidationErrors, email: String) -> Option<String> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return None;
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(email),
        _ => {
            errors.add("email", "Adresse email invalide");
            None
        }
    }
}

fn parse_role(errors: &mut ValidationErrors, role: &str) -> Option<Role> {
    match role.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.add("role", "Rôle utilisateur invalide");
            None
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Filter for the user list. Every present criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring of username, name or email.
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        if self.is_active.is_some_and(|active| active != user.is_active) {
            return false;
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(needle) if !needle.is_empty() => {
                user.username.to_lowercase().contains(&needle)
                    || user.name.to_lowercase().contains(&needle)
                    || user
                        .email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeletionDenied {
    #[error("Vous ne pouvez pas supprimer votre propre compte")]
    SelfDeletion,
    #[error("Seul un administrateur peut supprimer un administrateur")]
    AdminProtected,
}

/// Whether `actor` may delete `target`.
pub fn check_user_deletion(
    actor_id: UserId,
    actor_role: Role,
    target: &User,
) -> Result<(), DeletionDenied> {
    if actor_id == target.id {
        return Err(DeletionDenied::SelfDeletion);
    }
    if target.role.is_admin() && !actor_role.is_admin() {
        return Err(DeletionDenied::AdminProtected);
    }
    Ok(())
}
