//! Reporting handlers for dashboards, reports and sales analysis

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{csv_attachment, parse_choice, parse_period, wants_csv};
use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::CurrentUser;
use crate::services::reporting::{RankingQuery, ReportingService};
use crate::AppState;
use shared::{DashboardStats, FinancialPeriod, RankingSort, SortOrder};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Debug, Default, Deserialize)]
pub struct FinancialQuery {
    /// `daily` or `monthly`
    #[serde(rename = "type")]
    pub period: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopSellingQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub format: Option<String>,
}

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(state.db.clone(), state.config.reporting.clone())
}

/// Get dashboard headline figures
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = service(&state).dashboard_stats().await?;
    Ok(Json(stats))
}

/// Get inventory report
pub async fn get_inventory_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ReportQuery>,
) -> AppResult<Response> {
    let report = service(&state).inventory_report().await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&report.medicines)?;
        Ok(csv_attachment("inventory_report.csv", csv))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Get sales report for a date range
pub async fn get_sales_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ReportQuery>,
) -> AppResult<Response> {
    let period = parse_period(query.start_date.as_deref(), query.end_date.as_deref())?;
    let report = service(&state).sales_report(period).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&report.records)?;
        Ok(csv_attachment("sales_report.csv", csv))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Get inbound report for a date range
pub async fn get_inbound_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ReportQuery>,
) -> AppResult<Response> {
    let period = parse_period(query.start_date.as_deref(), query.end_date.as_deref())?;
    let report = service(&state).inbound_report(period).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&report.records)?;
        Ok(csv_attachment("inbound_report.csv", csv))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Get financial summary for today or the current month
pub async fn get_financial_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<FinancialQuery>,
) -> AppResult<Response> {
    let period = parse_choice::<FinancialPeriod>("type", query.period.as_deref())?
        .unwrap_or_default();
    let report = service(&state).financial_report(period).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(std::slice::from_ref(&report))?;
        Ok(csv_attachment("financial_report.csv", csv))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Get best-selling medicines
pub async fn get_top_selling(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<TopSellingQuery>,
) -> AppResult<Response> {
    let ranking = RankingQuery {
        period: parse_period(query.start_date.as_deref(), query.end_date.as_deref())?,
        sort_by: parse_choice::<RankingSort>("sort_by", query.sort_by.as_deref())?
            .unwrap_or_default(),
        order: parse_choice::<SortOrder>("order", query.order.as_deref())?.unwrap_or_default(),
        limit: query.limit,
    };
    let items = service(&state).top_selling(ranking).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&items)?;
        Ok(csv_attachment("top_selling.csv", csv))
    } else {
        Ok(Json(items).into_response())
    }
}

/// Get daily sales trend
pub async fn get_sales_trend(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    AppQuery(query): AppQuery<ReportQuery>,
) -> AppResult<Response> {
    let period = parse_period(query.start_date.as_deref(), query.end_date.as_deref())?;
    let trend = service(&state).trend(period).await?;

    if wants_csv(query.format.as_deref()) {
        let csv = ReportingService::export_to_csv(&trend.points)?;
        Ok(csv_attachment("sales_trend.csv", csv))
    } else {
        Ok(Json(trend).into_response())
    }
}
