//! Sale (order line) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::MedicineType;

/// One sold order line. `unit_price` is the medicine price at the moment of sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    pub id: i64,
    pub order_id: String,
    pub medicine_id: i64,
    /// None for walk-in customers
    pub customer_id: Option<i64>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
    pub created_by: Option<i64>,
}

/// Sale joined with medicine and customer for listings and reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleView {
    pub id: i64,
    pub order_id: String,
    pub medicine_id: i64,
    pub medicine_code: String,
    pub medicine_name: String,
    pub medicine_type: MedicineType,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
    /// Set once a sales return has reversed this sale
    pub returned: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(range(min = 1))]
    pub medicine_id: i64,
    /// Walk-in sales omit the customer (or send 0)
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

impl CreateSaleRequest {
    pub fn customer(&self) -> Option<i64> {
        self.customer_id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSaleRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Generate a human-readable order number, e.g. `ORD-20240315093012-1A2B3C4D`
pub fn generate_order_id(at: DateTime<Utc>, nonce: Uuid) -> String {
    let suffix: String = nonce.simple().to_string().chars().take(8).collect();
    format!("ORD-{}-{}", at.format("%Y%m%d%H%M%S"), suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_id_embeds_timestamp_and_nonce() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 12).unwrap();
        let nonce = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        assert_eq!(generate_order_id(at, nonce), "ORD-20240315093012-1A2B3C4D");
    }

    #[test]
    fn zero_customer_is_walk_in() {
        let req = CreateSaleRequest {
            medicine_id: 1,
            customer_id: Some(0),
            quantity: 2,
        };
        assert_eq!(req.customer(), None);
    }
}
