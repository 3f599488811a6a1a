//! HTTP handlers for stock adjustments and returns

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::ListQuery;
use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::LedgerService;
use crate::AppState;
use shared::{
    AdjustStockRequest, PaginatedResponse, Pagination, PurchaseReturn, PurchaseReturnRequest,
    SalesReturn, SalesReturnRequest, StockAdjustment,
};

#[derive(Debug, Default, Deserialize)]
pub struct AdjustmentQuery {
    pub medicine_id: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Set a medicine's stock to a counted value
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<AdjustStockRequest>,
) -> AppResult<(StatusCode, Json<StockAdjustment>)> {
    input.validate()?;

    let service = LedgerService::new(state.db);
    let adjustment = service.adjust_stock(current_user.0.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

pub async fn list_adjustments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<AdjustmentQuery>,
) -> AppResult<Json<PaginatedResponse<StockAdjustment>>> {
    let pagination = Pagination::new(query.page, query.limit);
    let adjustments = LedgerService::new(state.db)
        .list_adjustments(query.medicine_id, &pagination)
        .await?;
    Ok(Json(adjustments))
}

/// Send a received batch back to its supplier
pub async fn return_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<PurchaseReturnRequest>,
) -> AppResult<(StatusCode, Json<PurchaseReturn>)> {
    input.validate()?;

    let service = LedgerService::new(state.db);
    let record = service.return_purchase(current_user.0.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Take a sold order back into stock
pub async fn return_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<SalesReturnRequest>,
) -> AppResult<(StatusCode, Json<SalesReturn>)> {
    input.validate()?;

    let service = LedgerService::new(state.db);
    let record = service.return_sale(current_user.0.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_purchase_returns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<PurchaseReturn>>> {
    let returns = LedgerService::new(state.db)
        .list_purchase_returns(&query.pagination())
        .await?;
    Ok(Json(returns))
}

pub async fn list_sales_returns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<SalesReturn>>> {
    let returns = LedgerService::new(state.db)
        .list_sales_returns(&query.pagination())
        .await?;
    Ok(Json(returns))
}
