//! Purchase and sales returns

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_not_blank;

/// Reverses an inbound receipt: stock falls by the receipt quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseReturn {
    pub id: i64,
    pub inbound_id: i64,
    pub medicine_id: i64,
    pub quantity: i32,
    pub reason: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Reverses a sale: stock rises by the sold quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesReturn {
    pub id: i64,
    pub sale_id: i64,
    pub medicine_id: i64,
    pub quantity: i32,
    pub refund_amount: Decimal,
    pub reason: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PurchaseReturnRequest {
    #[validate(range(min = 1))]
    pub inbound_id: i64,
    #[validate(length(min = 1, max = 500), custom = "validate_not_blank")]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SalesReturnRequest {
    #[validate(range(min = 1))]
    pub sale_id: i64,
    #[validate(length(min = 1, max = 500), custom = "validate_not_blank")]
    pub reason: String,
}
