//! API error taxonomy
//!
//! `ApiError` is both the store error type and the only place where
//! failures become HTTP status codes. Every body has the shape
//! `{ "error": <label>, "message": <French sentence>, "details"?: ... }`.

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use digithr_core::user::DeletionDenied;
use digithr_core::{Role, ValidationErrors};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Données invalides: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentification requise")]
    Unauthenticated,

    #[error("Identifiants invalides")]
    InvalidCredentials,

    #[error("Compte désactivé")]
    AccountDisabled,

    #[error("Permissions insuffisantes")]
    Forbidden { required: Vec<Role>, actual: Role },

    #[error("{0}")]
    Denied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AccountDisabled | ApiError::Forbidden { .. } | ApiError::Denied(_) => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation error",
            ApiError::BadRequest(_) => "Bad request",
            ApiError::Unauthenticated => "Unauthorized",
            ApiError::InvalidCredentials => "Invalid credentials",
            ApiError::AccountDisabled => "Account disabled",
            ApiError::Forbidden { .. } | ApiError::Denied(_) => "Forbidden",
            ApiError::NotFound(_) => "Not found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Internal(_) => "Internal server error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(_) => "Données invalides".to_string(),
            ApiError::Internal(_) => "Erreur interne du serveur".to_string(),
            other => other.to_string(),
        }
    }
}

/// Internal error text, carried on the response so that
/// [`expose_internal_details`] can add it in development mode.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "error": self.label(),
            "message": self.message(),
        });

        match &self {
            ApiError::Validation(errors) => {
                body["details"] = json!(errors);
            }
            ApiError::Forbidden { required, actual } => {
                body["requiredRoles"] = json!(required);
                body["userRole"] = json!(actual);
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let ApiError::Internal(msg) = self {
            response.extensions_mut().insert(InternalErrorDetail(msg));
        }
        response
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<DeletionDenied> for ApiError {
    fn from(denied: DeletionDenied) -> Self {
        match denied {
            DeletionDenied::SelfDeletion => ApiError::BadRequest(denied.to_string()),
            DeletionDenied::AdminProtected => ApiError::Denied(denied.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "Rejected JSON body");
        ApiError::BadRequest("Corps de requête JSON invalide".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(%rejection, "Rejected path parameter");
        ApiError::BadRequest("Identifiant invalide".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(%rejection, "Rejected query string");
        ApiError::BadRequest("Paramètres de requête invalides".to_string())
    }
}

/// Response middleware: in development mode, copy the internal error text
/// into `details`; otherwise drop it.
pub async fn expose_internal_details(
    State(dev_mode): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(InternalErrorDetail(detail)) = response.extensions_mut().remove::<InternalErrorDetail>() else {
        return response;
    };
    if !dev_mode {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let mut json: Value = match axum::body::to_bytes(body, 64 * 1024).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({})),
        Err(_) => json!({}),
    };
    json["details"] = Value::String(detail);

    parts.headers.remove(header::CONTENT_LENGTH);
    let bytes = serde_json::to_vec(&json).unwrap_or_default();
    Response::from_parts(parts, Body::from(bytes))
}
