//! HTTP handlers for inbound receipts

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{Ack, ListQuery};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::LedgerService;
use crate::AppState;
use shared::{
    CreateInboundRequest, InboundRecord, InboundView, PaginatedResponse, UpdateInboundRequest,
};

/// Receive stock from a supplier
pub async fn create_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateInboundRequest>,
) -> AppResult<(StatusCode, Json<InboundRecord>)> {
    input.validate()?;

    let service = LedgerService::new(state.db);
    let record = service.create_inbound(current_user.0.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Edit quantity or unit price (admin only)
pub async fn update_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<UpdateInboundRequest>,
) -> AppResult<Json<InboundRecord>> {
    current_user.0.require_admin()?;
    input.validate()?;

    let service = LedgerService::new(state.db);
    let record = service
        .update_inbound(current_user.0.user_id, id, &input)
        .await?;
    Ok(Json(record))
}

/// Delete a receipt and take its quantity back out of stock (admin only)
pub async fn delete_inbound(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Ack>> {
    current_user.0.require_admin()?;

    LedgerService::new(state.db)
        .delete_inbound(current_user.0.user_id, id)
        .await?;
    Ok(Json(Ack::ok()))
}

pub async fn get_inbound(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<InboundView>> {
    let record = LedgerService::new(state.db).get_inbound(id).await?;
    Ok(Json(record))
}

pub async fn list_inbounds(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<InboundView>>> {
    let records = LedgerService::new(state.db)
        .list_inbounds(query.keyword.as_deref(), &query.pagination())
        .await?;
    Ok(Json(records))
}
