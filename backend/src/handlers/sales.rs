//! HTTP handlers for sales

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{parse_choice, Ack};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::LedgerService;
use crate::AppState;
use shared::{
    CreateSaleRequest, MedicineType, PaginatedResponse, Pagination, SaleRecord, SaleView,
    UpdateSaleRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct SaleQuery {
    pub keyword: Option<String>,
    /// Medicine type, `OTC` or `Prescription`
    #[serde(rename = "type")]
    pub medicine_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Sell from stock at the medicine's current price
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateSaleRequest>,
) -> AppResult<(StatusCode, Json<SaleRecord>)> {
    input.validate()?;

    let service = LedgerService::new(state.db);
    let sale = service.create_sale(current_user.0.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Change the quantity of a sale (admin only)
pub async fn update_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<UpdateSaleRequest>,
) -> AppResult<Json<SaleRecord>> {
    current_user.0.require_admin()?;
    input.validate()?;

    let service = LedgerService::new(state.db);
    let sale = service.update_sale(current_user.0.user_id, id, &input).await?;
    Ok(Json(sale))
}

/// Delete a sale and put its quantity back (admin only)
pub async fn delete_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Ack>> {
    current_user.0.require_admin()?;

    LedgerService::new(state.db)
        .delete_sale(current_user.0.user_id, id)
        .await?;
    Ok(Json(Ack::ok()))
}

pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<SaleView>> {
    let sale = LedgerService::new(state.db).get_sale(id).await?;
    Ok(Json(sale))
}

pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<SaleQuery>,
) -> AppResult<Json<PaginatedResponse<SaleView>>> {
    let medicine_type = parse_choice::<MedicineType>("type", query.medicine_type.as_deref())?;
    let pagination = Pagination::new(query.page, query.limit);

    let sales = LedgerService::new(state.db)
        .list_sales(query.keyword.as_deref(), medicine_type, &pagination)
        .await?;
    Ok(Json(sales))
}
