//! HTTP handlers for the medicine catalogue

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
use crate::services::{LedgerService, MedicineService};
use crate::AppState;
use shared::{
    CreateMedicineRequest, Medicine, MedicineLedger, PaginatedResponse, Pagination, StockFilter,
    UpdateMedicineRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct MedicineQuery {
    pub search: Option<String>,
    /// `low_stock` or `out_of_stock`
    pub filter: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Create a medicine
pub async fn create_medicine(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateMedicineRequest>,
) -> AppResult<(StatusCode, Json<Medicine>)> {
    input.validate()?;

    let service = MedicineService::new(state.db);
    let medicine = service.create(current_user.0.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

/// Update descriptive fields of a medicine
pub async fn update_medicine(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<UpdateMedicineRequest>,
) -> AppResult<Json<Medicine>> {
    input.validate()?;

    let service = MedicineService::new(state.db);
    let medicine = service.update(id, &input).await?;
    Ok(Json(medicine))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Ack>> {
    MedicineService::new(state.db).delete(id).await?;
    Ok(Json(Ack::ok()))
}

pub async fn get_medicine(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Medicine>> {
    let medicine = MedicineService::new(state.db).get(id).await?;
    Ok(Json(medicine))
}

/// List medicines
pub async fn list_medicines(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<MedicineQuery>,
) -> AppResult<Json<PaginatedResponse<Medicine>>> {
    let filter = parse_choice::<StockFilter>("filter", query.filter.as_deref())?;
    let pagination = Pagination::new(query.page, query.limit);

    let service = MedicineService::new(state.db);
    let medicines = service
        .list(
            query.search.as_deref(),
            filter,
            state.config.reporting.low_stock_threshold,
            &pagination,
        )
        .await?;
    Ok(Json(medicines))
}

/// Stock movement history of one medicine with its replay check
pub async fn get_medicine_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<MedicineLedger>> {
    let ledger = LedgerService::new(state.db).movements(id).await?;
    Ok(Json(ledger))
}
