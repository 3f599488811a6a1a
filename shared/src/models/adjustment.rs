//! Stock count corrections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_not_blank;

/// An absolute stock correction. The implied delta is `new_stock - previous_stock`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAdjustment {
    pub id: i64,
    pub medicine_id: i64,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub reason: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl StockAdjustment {
    pub fn difference(&self) -> i32 {
        self.new_stock - self.previous_stock
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockRequest {
    #[validate(range(min = 1))]
    pub medicine_id: i64,
    #[validate(range(min = 0))]
    pub new_stock: i32,
    #[validate(length(min = 1, max = 500), custom = "validate_not_blank")]
    pub reason: String,
}
