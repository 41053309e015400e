use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{StaffRole, UserProfile};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;
const GENERATED_PASSWORD_LEN: usize = 12;

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

// GET /api/admin/stats
#[derive(Serialize)]
pub struct StatsResponse {
    draft_count: i64,
    pending_count: i64,
    confirmed_count: i64,
    completed_count: i64,
    cancelled_count: i64,
    upcoming_deliveries: i64,
    confirmed_revenue: f64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatsResponse {
        draft_count: stats.draft_count,
        pending_count: stats.pending_count,
        confirmed_count: stats.confirmed_count,
        completed_count: stats.completed_count,
        cancelled_count: stats.cancelled_count,
        upcoming_deliveries: stats.upcoming_deliveries,
        confirmed_revenue: stats.confirmed_revenue,
    }))
}

// GET /api/admin/roles
//
// Feeds the role dropdown; the same enum backs create-user validation.
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<&'static str>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    Ok(Json(StaffRole::ALL.iter().map(|r| r.as_str()).collect()))
}

// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let profiles = {
        let db = state.db.lock().unwrap();
        queries::list_profiles(&db)?
    };

    Ok(Json(profiles))
}

// POST /api/admin/create-user
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct CreateUserResponse {
    id: String,
    email: String,
    role: String,
    password: String,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let email = body.email.trim().to_string();
    let full_name = body.full_name.trim().to_string();
    if email.is_empty() {
        return Err(AppError::Validation("E-post krävs.".to_string()));
    }
    if full_name.is_empty() {
        return Err(AppError::Validation("Namn krävs.".to_string()));
    }

    let role = StaffRole::parse(&body.role)
        .ok_or_else(|| AppError::Validation(format!("Ogiltig roll: {}", body.role)))?;

    let password = match body.password {
        Some(p) if p.len() < MIN_PASSWORD_LEN => {
            return Err(AppError::Validation(
                "Lösenordet måste vara minst 6 tecken.".to_string(),
            ));
        }
        Some(p) => p,
        None => generate_password(),
    };

    let auth_id = state
        .auth
        .create_user(&email, &password)
        .await
        .map_err(|e| AppError::Upstream(format!("Kunde inte skapa användare: {e}")))?;

    let inserted = {
        let db = state.db.lock().unwrap();
        queries::insert_profile(&db, &auth_id, &email, &full_name, role)
    };

    let mut effective_role = role;
    if let Err(e) = inserted {
        // Retry once with the default role before giving up on the profile
        let retried = if role != StaffRole::Sales {
            tracing::warn!(error = %e, email = %email, "profile insert failed, retrying with sales role");
            effective_role = StaffRole::Sales;
            let db = state.db.lock().unwrap();
            queries::insert_profile(&db, &auth_id, &email, &full_name, StaffRole::Sales)
        } else {
            Err(e)
        };

        if let Err(e) = retried {
            tracing::error!(error = %e, email = %email, "profile creation failed, rolling back auth identity");
            if let Err(del_err) = state.auth.delete_user(&auth_id).await {
                tracing::error!(error = %del_err, user_id = %auth_id, "failed to roll back auth identity");
            }
            return Err(AppError::Validation(
                "Kunde inte skapa användarprofil.".to_string(),
            ));
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            id: auth_id,
            email,
            role: effective_role.as_str().to_string(),
            password,
        }),
    ))
}

// POST /api/admin/reset-password
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub user_id: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Lösenordet måste vara minst 6 tecken.".to_string(),
        ));
    }

    state
        .auth
        .set_password(&body.user_id, &body.new_password)
        .await
        .map_err(|e| AppError::Upstream(format!("Kunde inte uppdatera lösenordet: {e}")))?;

    Ok(Json(
        serde_json::json!({"ok": true, "password": body.new_password}),
    ))
}
