use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Customer;
use crate::state::AppState;

// GET /api/customers
#[derive(Deserialize)]
pub struct CustomersQuery {
    pub limit: Option<i64>,
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CustomersQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(100);
    let customers = {
        let db = state.db.lock().unwrap();
        queries::list_customers(&db, limit)?
    };

    Ok(Json(customers))
}

// POST /api/customers
#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Namn krävs.".to_string()));
    }

    let customer = Customer {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        email: body.email,
        phone: body.phone,
        company: body.company,
        created_at: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_customer(&db, &customer)?;
    }

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers/:id
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let customer = {
        let db = state.db.lock().unwrap();
        queries::get_customer(&db, &id)?
    };

    match customer {
        Some(c) => Ok(Json(c)),
        None => Err(AppError::NotFound("Kunden kunde inte hittas.".to_string())),
    }
}
