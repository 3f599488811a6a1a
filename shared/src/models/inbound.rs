//! Inbound (purchase receipt) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_money;

/// A purchase receipt. Creating one raises the medicine's stock by `quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InboundRecord {
    pub id: i64,
    pub medicine_id: i64,
    pub supplier_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub inbound_date: DateTime<Utc>,
    pub created_by: Option<i64>,
}

impl InboundRecord {
    pub fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Inbound record joined with its medicine and supplier for listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InboundView {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_code: String,
    pub medicine_name: String,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub inbound_date: DateTime<Utc>,
    /// Set once a purchase return has reversed this receipt
    pub returned: bool,
}

impl InboundView {
    pub fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInboundRequest {
    #[validate(range(min = 1))]
    pub medicine_id: i64,
    #[validate(range(min = 1))]
    pub supplier_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[serde(alias = "price")]
    #[validate(custom = "validate_money")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInboundRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[serde(alias = "price")]
    #[validate(custom = "validate_money")]
    pub unit_price: Option<Decimal>,
}
