//! System maintenance handlers (admin only)

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::maintenance::{DatabaseStatus, RestoreSummary};
use crate::services::MaintenanceService;
use crate::AppState;

/// Download a SQL backup of all business data
pub async fn backup_database(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Response> {
    current_user.0.require_admin()?;

    let dump = MaintenanceService::new(state.db.clone()).backup().await?;
    let stamp = Utc::now().with_timezone(&state.config.reporting.offset());
    let filename = format!("backup_{}.sql", stamp.format("%Y%m%d_%H%M%S"));

    Ok((
        [
            (header::CONTENT_TYPE, "application/sql".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        dump,
    )
        .into_response())
}

/// Run a backup script sent as the raw request body
pub async fn restore_database(
    State(state): State<AppState>,
    current_user: CurrentUser,
    body: String,
) -> AppResult<Json<RestoreSummary>> {
    current_user.0.require_admin()?;

    tracing::info!(
        user_id = current_user.0.user_id,
        bytes = body.len(),
        "Restore requested"
    );
    let summary = MaintenanceService::new(state.db).restore(&body).await?;
    Ok(Json(summary))
}

pub async fn database_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DatabaseStatus>> {
    current_user.0.require_admin()?;

    let status = MaintenanceService::new(state.db).database_status().await;
    Ok(Json(status))
}
