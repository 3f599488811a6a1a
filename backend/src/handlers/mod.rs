//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod inbounds;
pub mod medicines;
pub mod parties;
pub mod reporting;
pub mod sales;
pub mod stock;
pub mod system;
pub mod users;

pub use auth::*;
pub use health::*;
pub use inbounds::*;
pub use medicines::*;
pub use parties::*;
pub use reporting::*;
pub use sales::*;
pub use stock::*;
pub use system::*;
pub use users::*;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::de::{value::StrDeserializer, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::reporting::ReportPeriod;
use shared::Pagination;

/// Body returned by deletes
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Common query string of list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

/// Query string for `/search/*`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

/// Empty values mean "not given"
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a `YYYY-MM-DD` query value
pub(crate) fn parse_day(field: &str, raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    present(raw)
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                AppError::invalid(
                    field,
                    &format!("{field} must be a date in YYYY-MM-DD format"),
                    "日期格式应为 YYYY-MM-DD",
                )
            })
        })
        .transpose()
}

pub(crate) fn parse_period(start: Option<&str>, end: Option<&str>) -> AppResult<ReportPeriod> {
    Ok(ReportPeriod {
        start: parse_day("start_date", start)?,
        end: parse_day("end_date", end)?,
    })
}

/// Parse a query value into one of the serde-named variants of `T`
pub(crate) fn parse_choice<T: DeserializeOwned>(field: &str, raw: Option<&str>) -> AppResult<Option<T>> {
    present(raw)
        .map(|value| {
            let de: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
            T::deserialize(de).map_err(|_| {
                AppError::invalid(
                    field,
                    &format!("Unsupported value for {field}: {value}"),
                    &format!("参数 {field} 的取值无效"),
                )
            })
        })
        .transpose()
}

pub(crate) fn wants_csv(format: Option<&str>) -> bool {
    present(format).is_some_and(|f| f.eq_ignore_ascii_case("csv"))
}

/// `text/csv` attachment response
pub(crate) fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{FinancialPeriod, MedicineType, RankingSort, StockFilter};

    #[test]
    fn blank_dates_are_absent() {
        assert_eq!(parse_day("start_date", Some("  ")).unwrap(), None);
        assert_eq!(
            parse_day("start_date", Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_day("start_date", Some("2024/02/29")).is_err());
    }

    #[test]
    fn choices_use_wire_names() {
        assert_eq!(
            parse_choice::<StockFilter>("filter", Some("low_stock")).unwrap(),
            Some(StockFilter::LowStock)
        );
        assert_eq!(
            parse_choice::<MedicineType>("type", Some("Rx")).unwrap(),
            Some(MedicineType::Prescription)
        );
        assert_eq!(
            parse_choice::<RankingSort>("sort_by", Some("total_profit")).unwrap(),
            Some(RankingSort::TotalProfit)
        );
        assert_eq!(
            parse_choice::<FinancialPeriod>("type", None).unwrap(),
            None
        );
        assert!(parse_choice::<FinancialPeriod>("type", Some("weekly")).is_err());
    }

    #[test]
    fn csv_format_is_case_insensitive() {
        assert!(wants_csv(Some("CSV")));
        assert!(!wants_csv(Some("json")));
        assert!(!wants_csv(None));
    }
}
