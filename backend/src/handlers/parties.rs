//! HTTP handlers for customers and suppliers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{Ack, ListQuery, SearchQuery};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::PartyService;
use crate::AppState;
use shared::{Customer, CustomerRequest, PaginatedResponse, Supplier, SupplierRequest};

pub async fn create_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppJson(input): AppJson<CustomerRequest>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    input.validate()?;
    let customer = PartyService::new(state.db).create_customer(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<CustomerRequest>,
) -> AppResult<Json<Customer>> {
    input.validate()?;
    let customer = PartyService::new(state.db).update_customer(id, &input).await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Ack>> {
    PartyService::new(state.db).delete_customer(id).await?;
    Ok(Json(Ack::ok()))
}

pub async fn list_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Customer>>> {
    let customers = PartyService::new(state.db)
        .list_customers(query.keyword.as_deref(), &query.pagination())
        .await?;
    Ok(Json(customers))
}

/// Unpaginated customer lookup for the sale form
pub async fn search_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = PartyService::new(state.db)
        .search_customers(query.keyword.as_deref())
        .await?;
    Ok(Json(customers))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppJson(input): AppJson<SupplierRequest>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    input.validate()?;
    let supplier = PartyService::new(state.db).create_supplier(&input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<SupplierRequest>,
) -> AppResult<Json<Supplier>> {
    input.validate()?;
    let supplier = PartyService::new(state.db).update_supplier(id, &input).await?;
    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Ack>> {
    PartyService::new(state.db).delete_supplier(id).await?;
    Ok(Json(Ack::ok()))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Supplier>>> {
    let suppliers = PartyService::new(state.db)
        .list_suppliers(query.keyword.as_deref(), &query.pagination())
        .await?;
    Ok(Json(suppliers))
}

pub async fn search_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<Supplier>>> {
    let suppliers = PartyService::new(state.db)
        .search_suppliers(query.keyword.as_deref())
        .await?;
    Ok(Json(suppliers))
}
