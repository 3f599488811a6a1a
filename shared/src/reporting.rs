//! Report aggregation
//!
//! Pure transforms over rows the backend has already loaded. Nothing here
//! writes, and identical input always yields identical output: maps are
//! ordered and every sort has a final tie-break on id.
//!
//! Returned sales and returned inbounds stay visible in record listings but
//! are left out of every revenue, cost, ranking and trend figure.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{InboundView, Medicine, MedicineType, SaleView};
use crate::types::DateRange;

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 50;

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Cost basis
// ============================================================================

/// Received quantity and amount of one medicine, summed over non-returned inbounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InboundCost {
    pub medicine_id: i64,
    pub quantity: i64,
    pub amount: Decimal,
}

/// Weighted-average inbound unit cost per medicine
#[derive(Debug, Clone, Default)]
pub struct CostBasis {
    unit_costs: HashMap<i64, Decimal>,
}

impl CostBasis {
    pub fn from_totals<I>(totals: I) -> Self
    where
        I: IntoIterator<Item = InboundCost>,
    {
        let unit_costs = totals
            .into_iter()
            .filter(|t| t.quantity > 0)
            .map(|t| (t.medicine_id, t.amount / Decimal::from(t.quantity)))
            .collect();
        Self { unit_costs }
    }

    pub fn unit_cost(&self, medicine_id: i64) -> Option<Decimal> {
        self.unit_costs.get(&medicine_id).copied()
    }

    /// Cost of goods sold; medicines never received cost nothing
    pub fn cost_of(&self, medicine_id: i64, quantity: i64) -> Decimal {
        self.unit_cost(medicine_id)
            .map(|unit| cents(unit * Decimal::from(quantity)))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn profit(&self, sale: &SaleView) -> Decimal {
        sale.total_price - self.cost_of(sale.medicine_id, i64::from(sale.quantity))
    }
}

// ============================================================================
// Stock
// ============================================================================

pub fn is_low_stock(stock: i32, threshold: i32) -> bool {
    stock < threshold
}

/// Dashboard headline figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DashboardStats {
    pub total_stock: i64,
    /// Month-to-date revenue
    pub month_sales: Decimal,
    /// Medicines below the low-stock threshold, empty ones included
    pub low_stock: i64,
    pub medicine_count: i64,
    pub today_sales: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    /// Ordered by stock ascending
    pub medicines: Vec<Medicine>,
    pub total_stock: i64,
    pub total_value: Decimal,
    /// In stock but below the threshold
    pub low_stock_items: Vec<Medicine>,
    pub out_of_stock_items: Vec<Medicine>,
}

pub fn inventory_report(mut medicines: Vec<Medicine>, threshold: i32) -> InventoryReport {
    medicines.sort_by(|a, b| a.stock.cmp(&b.stock).then(a.id.cmp(&b.id)));

    let total_stock = medicines.iter().map(|m| i64::from(m.stock)).sum();
    let total_value = medicines
        .iter()
        .map(|m| m.price * Decimal::from(m.stock))
        .sum();
    let out_of_stock_items = medicines.iter().filter(|m| m.stock == 0).cloned().collect();
    let low_stock_items = medicines
        .iter()
        .filter(|m| m.stock > 0 && is_low_stock(m.stock, threshold))
        .cloned()
        .collect();

    InventoryReport {
        medicines,
        total_stock,
        total_value,
        low_stock_items,
        out_of_stock_items,
    }
}

// ============================================================================
// Record reports
// ============================================================================

/// Records of a date range with their totals
#[derive(Debug, Clone, Serialize)]
pub struct RecordReport<T> {
    pub records: Vec<T>,
    pub total_quantity: i64,
    pub total_amount: Decimal,
}

pub fn sales_report(mut records: Vec<SaleView>) -> RecordReport<SaleView> {
    records.sort_by(|a, b| b.sale_date.cmp(&a.sale_date).then(b.id.cmp(&a.id)));
    let counted = records.iter().filter(|s| !s.returned);
    let total_quantity = counted.clone().map(|s| i64::from(s.quantity)).sum();
    let total_amount = counted.map(|s| s.total_price).sum();
    RecordReport {
        records,
        total_quantity,
        total_amount,
    }
}

pub fn inbound_report(mut records: Vec<InboundView>) -> RecordReport<InboundView> {
    records.sort_by(|a, b| b.inbound_date.cmp(&a.inbound_date).then(b.id.cmp(&a.id)));
    let counted = records.iter().filter(|r| !r.returned);
    let total_quantity = counted.clone().map(|r| i64::from(r.quantity)).sum();
    let total_amount = counted.map(InboundView::amount).sum();
    RecordReport {
        records,
        total_quantity,
        total_amount,
    }
}

// ============================================================================
// Financial
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialPeriod {
    Daily,
    #[default]
    Monthly,
}

impl FinancialPeriod {
    /// First local day of the period containing `today`
    pub fn period_start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            FinancialPeriod::Daily => today,
            FinancialPeriod::Monthly => today.with_day(1).unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub report_type: FinancialPeriod,
    pub start_date: NaiveDate,
    pub sales_income: Decimal,
    pub purchase_cost: Decimal,
    /// Income minus cost of goods sold
    pub gross_profit: Decimal,
    pub sales_count: i64,
    pub purchase_count: i64,
}

/// `sales` and `inbounds` must already be limited to the period
pub fn financial_report(
    period: FinancialPeriod,
    start_date: NaiveDate,
    sales: &[SaleView],
    inbounds: &[InboundView],
    costs: &CostBasis,
) -> FinancialReport {
    let mut sales_income = Decimal::ZERO;
    let mut cogs = Decimal::ZERO;
    let mut sales_count = 0;
    for sale in sales.iter().filter(|s| !s.returned) {
        sales_income += sale.total_price;
        cogs += costs.cost_of(sale.medicine_id, i64::from(sale.quantity));
        sales_count += 1;
    }

    let mut purchase_cost = Decimal::ZERO;
    let mut purchase_count = 0;
    for inbound in inbounds.iter().filter(|i| !i.returned) {
        purchase_cost += inbound.amount();
        purchase_count += 1;
    }

    FinancialReport {
        report_type: period,
        start_date,
        sales_income,
        purchase_cost: cents(purchase_cost),
        gross_profit: sales_income - cogs,
        sales_count,
        purchase_count,
    }
}

// ============================================================================
// Top selling
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSort {
    #[default]
    TotalSold,
    TotalRevenue,
    TotalProfit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSellingItem {
    pub medicine_id: i64,
    pub code: String,
    pub name: String,
    pub medicine_type: MedicineType,
    pub total_sold: i64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub order_count: i64,
}

impl TopSellingItem {
    fn compare(&self, other: &Self, sort: RankingSort) -> Ordering {
        match sort {
            RankingSort::TotalSold => self.total_sold.cmp(&other.total_sold),
            RankingSort::TotalRevenue => self.total_revenue.cmp(&other.total_revenue),
            RankingSort::TotalProfit => self.total_profit.cmp(&other.total_profit),
        }
    }
}

/// Per-medicine sales totals, ranked. Ties always go to the lower medicine id.
pub fn top_selling(
    sales: &[SaleView],
    costs: &CostBasis,
    sort: RankingSort,
    order: SortOrder,
    limit: usize,
) -> Vec<TopSellingItem> {
    let mut totals: BTreeMap<i64, TopSellingItem> = BTreeMap::new();
    for sale in sales.iter().filter(|s| !s.returned) {
        let item = totals
            .entry(sale.medicine_id)
            .or_insert_with(|| TopSellingItem {
                medicine_id: sale.medicine_id,
                code: sale.medicine_code.clone(),
                name: sale.medicine_name.clone(),
                medicine_type: sale.medicine_type,
                total_sold: 0,
                total_revenue: Decimal::ZERO,
                total_profit: Decimal::ZERO,
                order_count: 0,
            });
        item.total_sold += i64::from(sale.quantity);
        item.total_revenue += sale.total_price;
        item.total_profit += costs.profit(sale);
        item.order_count += 1;
    }

    let mut ranked: Vec<_> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        let primary = match order {
            SortOrder::Desc => b.compare(a, sort),
            SortOrder::Asc => a.compare(b, sort),
        };
        primary.then(a.medicine_id.cmp(&b.medicine_id))
    });
    ranked.truncate(limit);
    ranked
}

// ============================================================================
// Daily trend
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub sale_day: NaiveDate,
    pub total_revenue: Decimal,
    pub order_count: i64,
    pub total_quantity: i64,
    pub total_profit: Decimal,
}

impl TrendPoint {
    fn empty(sale_day: NaiveDate) -> Self {
        Self {
            sale_day,
            total_revenue: Decimal::ZERO,
            order_count: 0,
            total_quantity: 0,
            total_profit: Decimal::ZERO,
        }
    }
}

/// Calendar day of an instant in the reporting offset
pub fn local_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// UTC instants bounding a range of local days: `[start 00:00, end+1 00:00)`
pub fn day_bounds(
    range: &DateRange,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let to_utc = |day: NaiveDate| {
        day.and_time(NaiveTime::MIN)
            .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
            .map(|utc| Utc.from_utc_datetime(&utc))
    };
    let after_end = range.end.checked_add_signed(Duration::days(1))?;
    Some((to_utc(range.start)?, to_utc(after_end)?))
}

/// One point per day of `range`, zero-filled where nothing was sold
pub fn daily_trend(
    sales: &[SaleView],
    costs: &CostBasis,
    range: &DateRange,
    offset: FixedOffset,
) -> Vec<TrendPoint> {
    let mut points: BTreeMap<NaiveDate, TrendPoint> =
        range.days().map(|day| (day, TrendPoint::empty(day))).collect();

    for sale in sales.iter().filter(|s| !s.returned) {
        let day = local_day(sale.sale_date, offset);
        if let Some(point) = points.get_mut(&day) {
            point.total_revenue += sale.total_price;
            point.order_count += 1;
            point.total_quantity += i64::from(sale.quantity);
            point.total_profit += costs.profit(sale);
        }
    }

    points.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn cost_basis_is_weighted_by_quantity() {
        let costs = CostBasis::from_totals(vec![
            InboundCost {
                medicine_id: 1,
                quantity: 40,
                amount: dec("360.00"),
            },
            InboundCost {
                medicine_id: 2,
                quantity: 0,
                amount: Decimal::ZERO,
            },
        ]);
        assert_eq!(costs.unit_cost(1), Some(dec("9")));
        assert_eq!(costs.unit_cost(2), None);
        assert_eq!(costs.cost_of(1, 3), dec("27.00"));
        assert_eq!(costs.cost_of(3, 10), Decimal::ZERO);
    }

    #[test]
    fn monthly_period_starts_on_first() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(
            FinancialPeriod::Monthly.period_start(today),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(FinancialPeriod::Daily.period_start(today), today);
    }

    #[test]
    fn day_bounds_follow_offset() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let range = DateRange::new(day, day).unwrap();
        let (start, end) = day_bounds(&range, offset).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 16, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap());
        assert_eq!(local_day(start, offset), day);
        assert_eq!(local_day(end - Duration::seconds(1), offset), day);
    }

    #[test]
    fn day_bounds_outside_calendar_are_none() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let last = DateRange::new(NaiveDate::MAX, NaiveDate::MAX).unwrap();
        assert_eq!(day_bounds(&last, offset), None);

        let first = DateRange::new(NaiveDate::MIN, NaiveDate::MIN).unwrap();
        assert_eq!(day_bounds(&first, offset), None);
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        assert!(is_low_stock(49, DEFAULT_LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(50, DEFAULT_LOW_STOCK_THRESHOLD));
    }
}
