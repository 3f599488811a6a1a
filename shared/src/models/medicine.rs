//! Medicine catalogue models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{validate_money, validate_not_blank};

/// A medicine and its on-hand stock counter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    pub id: i64,
    /// Unique catalogue code
    pub code: String,
    pub name: String,
    /// Packaging/strength, e.g. "0.25g*24片"
    pub spec: String,
    #[serde(rename = "type")]
    pub medicine_type: MedicineType,
    pub price: Decimal,
    /// Never negative; only the stock ledger writes it
    pub stock: i32,
    pub manufacturer: String,
    pub status: MedicineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dispensing class
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "medicine_type"))]
pub enum MedicineType {
    #[serde(rename = "OTC")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "OTC"))]
    Otc,
    #[serde(rename = "Prescription", alias = "Rx")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Prescription"))]
    Prescription,
}

impl std::fmt::Display for MedicineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MedicineType::Otc => write!(f, "OTC"),
            MedicineType::Prescription => write!(f, "Prescription"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "medicine_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MedicineStatus {
    #[default]
    Active,
    Inactive,
}

/// Optional list filter for medicines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    LowStock,
    OutOfStock,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMedicineRequest {
    #[validate(length(min = 1, max = 64), custom = "validate_not_blank")]
    pub code: String,
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub spec: String,
    #[serde(rename = "type")]
    pub medicine_type: MedicineType,
    #[validate(custom = "validate_money")]
    pub price: Decimal,
    /// Opening balance, recorded as an `opening` movement when non-zero
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub manufacturer: String,
    pub status: Option<MedicineStatus>,
}

/// Partial update of descriptive fields. Stock only changes through the ledger.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMedicineRequest {
    #[validate(length(min = 1, max = 64), custom = "validate_not_blank")]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub spec: Option<String>,
    #[serde(rename = "type")]
    pub medicine_type: Option<MedicineType>,
    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
    #[validate(length(max = 200))]
    pub manufacturer: Option<String>,
    pub status: Option<MedicineStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medicine_type_uses_display_names_on_the_wire() {
        assert_eq!(serde_json::to_string(&MedicineType::Otc).unwrap(), "\"OTC\"");
        let rx: MedicineType = serde_json::from_str("\"Rx\"").unwrap();
        assert_eq!(rx, MedicineType::Prescription);
    }

    #[test]
    fn create_request_rejects_negative_price_and_blank_code() {
        let req: CreateMedicineRequest = serde_json::from_value(serde_json::json!({
            "code": "   ",
            "name": "阿莫西林胶囊",
            "type": "Prescription",
            "price": "-1.00"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("code"));
        assert!(fields.contains_key("price"));
    }

    #[test]
    fn update_request_has_no_stock_field() {
        let req: UpdateMedicineRequest =
            serde_json::from_value(serde_json::json!({ "stock": 999, "name": "维C" })).unwrap();
        assert_eq!(req.name.as_deref(), Some("维C"));
        assert!(req.validate().is_ok());
    }
}
