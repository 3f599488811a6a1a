//! Stock movement audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::ReplayCheck;

/// What produced a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "stock_movement_kind", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Opening,
    Inbound,
    Sale,
    Adjustment,
    PurchaseReturn,
    SalesReturn,
    InboundEdit,
    InboundDelete,
    SaleEdit,
    SaleDelete,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Opening => "opening",
            MovementKind::Inbound => "inbound",
            MovementKind::Sale => "sale",
            MovementKind::Adjustment => "adjustment",
            MovementKind::PurchaseReturn => "purchase_return",
            MovementKind::SalesReturn => "sales_return",
            MovementKind::InboundEdit => "inbound_edit",
            MovementKind::InboundDelete => "inbound_delete",
            MovementKind::SaleEdit => "sale_edit",
            MovementKind::SaleDelete => "sale_delete",
        }
    }

    /// Adjustments set an absolute value instead of applying their delta
    pub fn is_absolute(&self) -> bool {
        matches!(self, MovementKind::Adjustment)
    }
}

/// One row of the append-only audit trail, written in the same
/// transaction as the stock update it describes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub medicine_id: i64,
    pub kind: MovementKind,
    /// Id of the inbound/sale/adjustment/return row, when there is one
    pub reference_id: Option<i64>,
    pub delta: i32,
    pub stock_before: i32,
    pub stock_after: i32,
    pub reason: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Audit trail of one medicine with its replay check
#[derive(Debug, Clone, Serialize)]
pub struct MedicineLedger {
    pub medicine_id: i64,
    pub movements: Vec<StockMovement>,
    #[serde(flatten)]
    pub check: ReplayCheck,
}
