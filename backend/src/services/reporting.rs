//! Reporting service for dashboards, reports and sales analysis
//!
//! Loads rows with plain SQL and leaves the arithmetic to `shared::reporting`.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::ReportingConfig;
use crate::error::{AppError, AppResult};
use crate::services::ledger::{INBOUND_VIEW_SELECT, SALE_VIEW_SELECT};
use shared::{
    daily_trend, day_bounds, financial_report, inbound_report, inventory_report, local_day,
    sales_report, top_selling, CostBasis, DashboardStats, DateRange, FinancialPeriod,
    FinancialReport, InboundCost, InboundView, InventoryReport, Medicine, RankingSort,
    RecordReport, SaleView, SortOrder, TopSellingItem, TrendPoint,
};

/// Upper bound for `limit` on top-selling queries
pub const MAX_TOP_SELLING_LIMIT: usize = 100;

const TREND_DEFAULT_DAYS: u32 = 30;

/// Optional date bounds as given on the query string (local calendar days, inclusive)
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportPeriod {
    /// UTC bounds `[from, to)`; a missing side is unbounded
    fn bounds(
        &self,
        offset: FixedOffset,
    ) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(invalid_range());
            }
        }
        let from = self
            .start
            .map(|day| single_day(day, offset).map(|(from, _)| from))
            .transpose()?;
        let to = self
            .end
            .map(|day| single_day(day, offset).map(|(_, to)| to))
            .transpose()?;
        Ok((from, to))
    }
}

fn single_day(day: NaiveDate, offset: FixedOffset) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    utc_bounds(&DateRange { start: day, end: day }, offset)
}

fn utc_bounds(range: &DateRange, offset: FixedOffset) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    day_bounds(range, offset).ok_or_else(out_of_calendar)
}

fn out_of_calendar() -> AppError {
    AppError::invalid("end_date", "date is out of range", "日期超出范围")
}

fn invalid_range() -> AppError {
    AppError::invalid(
        "start_date",
        "start_date must not be after end_date",
        "开始日期不能晚于结束日期",
    )
}

/// Top-selling query parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingQuery {
    pub period: ReportPeriod,
    pub sort_by: RankingSort,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

/// Trend response with the resolved range
#[derive(Debug, Serialize)]
pub struct TrendReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points: Vec<TrendPoint>,
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
    settings: ReportingConfig,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool, settings: ReportingConfig) -> Self {
        Self { db, settings }
    }

    fn today(&self) -> NaiveDate {
        local_day(Utc::now(), self.settings.offset())
    }

    /// Stock totals plus month-to-date and today's revenue
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let offset = self.settings.offset();
        let today = self.today();
        let month_start = FinancialPeriod::Monthly.period_start(today);
        let (month_from, _) = utc_bounds(&DateRange { start: month_start, end: today }, offset)?;
        let (today_from, _) = single_day(today, offset)?;

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COALESCE(SUM(stock), 0)::BIGINT FROM medicines) AS total_stock,
                (SELECT COUNT(*) FROM medicines WHERE stock < $1) AS low_stock,
                (SELECT COUNT(*) FROM medicines) AS medicine_count,
                COALESCE(SUM(s.total_price), 0) AS month_sales,
                COALESCE(SUM(s.total_price) FILTER (WHERE s.sale_date >= $3), 0) AS today_sales
            FROM sales s
            WHERE s.sale_date >= $2
              AND NOT EXISTS (SELECT 1 FROM sales_returns sr WHERE sr.sale_id = s.id)
            "#,
        )
        .bind(self.settings.low_stock_threshold)
        .bind(month_from)
        .bind(today_from)
        .fetch_one(&self.db)
        .await?;

        Ok(stats)
    }

    pub async fn inventory_report(&self) -> AppResult<InventoryReport> {
        let medicines = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT id, code, name, spec, medicine_type, price, stock, manufacturer, status,
                   created_at, updated_at
            FROM medicines
            ORDER BY stock ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(inventory_report(medicines, self.settings.low_stock_threshold))
    }

    pub async fn sales_report(&self, period: ReportPeriod) -> AppResult<RecordReport<SaleView>> {
        let (from, to) = period.bounds(self.settings.offset())?;
        let sales = self.load_sales(from, to).await?;
        Ok(sales_report(sales))
    }

    pub async fn inbound_report(
        &self,
        period: ReportPeriod,
    ) -> AppResult<RecordReport<InboundView>> {
        let (from, to) = period.bounds(self.settings.offset())?;
        let inbounds = self.load_inbounds(from, to).await?;
        Ok(inbound_report(inbounds))
    }

    /// Income, purchase spend and gross profit since the start of today or this month
    pub async fn financial_report(&self, kind: FinancialPeriod) -> AppResult<FinancialReport> {
        let today = self.today();
        let start_date = kind.period_start(today);
        let (from, _) =
            utc_bounds(&DateRange { start: start_date, end: today }, self.settings.offset())?;

        let sales = self.load_sales(Some(from), None).await?;
        let inbounds = self.load_inbounds(Some(from), None).await?;
        let costs = self.cost_basis().await?;

        Ok(financial_report(kind, start_date, &sales, &inbounds, &costs))
    }

    pub async fn top_selling(&self, query: RankingQuery) -> AppResult<Vec<TopSellingItem>> {
        let (from, to) = query.period.bounds(self.settings.offset())?;
        let limit = query
            .limit
            .unwrap_or(self.settings.default_top_selling_limit)
            .clamp(1, MAX_TOP_SELLING_LIMIT);

        let sales = self.load_sales(from, to).await?;
        let costs = self.cost_basis().await?;

        Ok(top_selling(&sales, &costs, query.sort_by, query.order, limit))
    }

    /// Daily revenue for an inclusive range, defaulting to the last 30 days
    pub async fn trend(&self, period: ReportPeriod) -> AppResult<TrendReport> {
        let range = self.trend_range(period)?;
        let offset = self.settings.offset();
        let (from, to) = utc_bounds(&range, offset)?;

        let sales = self.load_sales(Some(from), Some(to)).await?;
        let costs = self.cost_basis().await?;

        Ok(TrendReport {
            start_date: range.start,
            end_date: range.end,
            points: daily_trend(&sales, &costs, &range, offset),
        })
    }

    fn trend_range(&self, period: ReportPeriod) -> AppResult<DateRange> {
        let range = match (period.start, period.end) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok_or_else(invalid_range)?,
            (Some(start), None) => {
                DateRange::new(start, self.today().max(start)).ok_or_else(invalid_range)?
            }
            (None, Some(end)) => {
                DateRange::trailing(end, TREND_DEFAULT_DAYS).ok_or_else(out_of_calendar)?
            }
            (None, None) => DateRange::trailing(self.today(), TREND_DEFAULT_DAYS)
                .ok_or_else(out_of_calendar)?,
        };

        if range.len_days() > self.settings.max_trend_days {
            return Err(AppError::invalid(
                "end_date",
                &format!(
                    "Trend range may cover at most {} days",
                    self.settings.max_trend_days
                ),
                &format!("趋势统计最多支持 {} 天", self.settings.max_trend_days),
            ));
        }
        Ok(range)
    }

    async fn load_sales(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<SaleView>> {
        let sales = sqlx::query_as::<_, SaleView>(&format!(
            "{SALE_VIEW_SELECT} \
             WHERE ($1::timestamptz IS NULL OR s.sale_date >= $1) \
               AND ($2::timestamptz IS NULL OR s.sale_date < $2) \
             ORDER BY s.sale_date DESC, s.id DESC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;
        Ok(sales)
    }

    async fn load_inbounds(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<InboundView>> {
        let inbounds = sqlx::query_as::<_, InboundView>(&format!(
            "{INBOUND_VIEW_SELECT} \
             WHERE ($1::timestamptz IS NULL OR i.inbound_date >= $1) \
               AND ($2::timestamptz IS NULL OR i.inbound_date < $2) \
             ORDER BY i.inbound_date DESC, i.id DESC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;
        Ok(inbounds)
    }

    /// Weighted-average unit cost over every receipt that was not returned
    async fn cost_basis(&self) -> AppResult<CostBasis> {
        let totals = sqlx::query_as::<_, InboundCost>(
            r#"
            SELECT i.medicine_id,
                   SUM(i.quantity)::BIGINT AS quantity,
                   SUM(i.quantity * i.unit_price) AS amount
            FROM inbounds i
            WHERE NOT EXISTS (SELECT 1 FROM purchase_returns pr WHERE pr.inbound_id = i.id)
            GROUP BY i.medicine_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(CostBasis::from_totals(totals))
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
