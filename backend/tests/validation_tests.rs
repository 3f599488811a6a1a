//! Request validation tests
//!
//! Request bodies are validated before they reach the ledger; these tests
//! check the boundary rules of each schema.

use serde_json::json;
use shared::{
    generate_order_id, summarize, AdjustStockRequest, CreateInboundRequest, CreateMedicineRequest,
    CreateSaleRequest, MedicineType, PurchaseReturnRequest, SalesReturnRequest,
    UpdateUserRequest,
};
use validator::Validate;

fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_valid_medicine_request() {
    let req: CreateMedicineRequest = parse(json!({
        "code": "MED001",
        "name": "阿莫西林胶囊",
        "spec": "0.25g*24粒",
        "type": "Prescription",
        "price": "12.50",
        "manufacturer": "华北制药"
    }));
    assert!(req.validate().is_ok());
    assert_eq!(req.medicine_type, MedicineType::Prescription);
    assert_eq!(req.stock, 0);
}

#[test]
fn test_medicine_price_rules() {
    for price in ["-1.00", "1.005"] {
        let req: CreateMedicineRequest = parse(json!({
            "code": "MED002",
            "name": "布洛芬缓释胶囊",
            "spec": "0.3g*20粒",
            "type": "OTC",
            "price": price,
            "manufacturer": "中美史克"
        }));
        let errors = req.validate().unwrap_err();
        let (field, _) = summarize(&errors);
        assert_eq!(field, "price", "price {price} should be rejected");
    }
}

#[test]
fn test_blank_medicine_name_is_rejected() {
    let req: CreateMedicineRequest = parse(json!({
        "code": "MED003",
        "name": "   ",
        "spec": "",
        "type": "OTC",
        "price": "3.00",
        "manufacturer": ""
    }));
    let (field, message) = summarize(&req.validate().unwrap_err());
    assert_eq!(field, "name");
    assert!(message.starts_with("name "));
}

#[test]
fn test_inbound_quantity_must_be_positive() {
    let req: CreateInboundRequest = parse(json!({
        "medicine_id": 1,
        "supplier_id": 2,
        "quantity": 0,
        "unit_price": "10.00"
    }));
    let (field, _) = summarize(&req.validate().unwrap_err());
    assert_eq!(field, "quantity");
}

#[test]
fn test_inbound_accepts_price_alias() {
    let req: CreateInboundRequest = parse(json!({
        "medicine_id": 1,
        "supplier_id": 2,
        "quantity": 50,
        "price": "10.00"
    }));
    assert!(req.validate().is_ok());
    assert_eq!(req.unit_price.to_string(), "10.00");
}

#[test]
fn test_walk_in_sale_has_no_customer() {
    let req: CreateSaleRequest = parse(json!({ "medicine_id": 1, "quantity": 2 }));
    assert!(req.validate().is_ok());
    assert_eq!(req.customer(), None);

    let req: CreateSaleRequest =
        parse(json!({ "medicine_id": 1, "customer_id": 0, "quantity": 2 }));
    assert_eq!(req.customer(), None);

    let req: CreateSaleRequest =
        parse(json!({ "medicine_id": 1, "customer_id": 5, "quantity": 2 }));
    assert_eq!(req.customer(), Some(5));
}

#[test]
fn test_negative_adjustment_is_rejected() {
    let req: AdjustStockRequest = parse(json!({
        "medicine_id": 1,
        "new_stock": -1,
        "reason": "盘点"
    }));
    let (field, _) = summarize(&req.validate().unwrap_err());
    assert_eq!(field, "new_stock");
}

#[test]
fn test_adjustment_reason_is_required() {
    let req: AdjustStockRequest = parse(json!({
        "medicine_id": 1,
        "new_stock": 0,
        "reason": "  "
    }));
    let (field, _) = summarize(&req.validate().unwrap_err());
    assert_eq!(field, "reason");
}

#[test]
fn test_return_reasons_are_required() {
    let purchase: PurchaseReturnRequest = parse(json!({ "inbound_id": 3, "reason": "" }));
    assert!(purchase.validate().is_err());

    let sales: SalesReturnRequest = parse(json!({ "sale_id": 3, "reason": "过敏退货" }));
    assert!(sales.validate().is_ok());
}

#[test]
fn test_empty_password_keeps_existing_hash() {
    let req: UpdateUserRequest = parse(json!({ "real_name": "李四", "password": "" }));
    assert!(req.validate().is_ok());
    assert_eq!(req.new_password(), None);
}

#[test]
fn test_order_id_format() {
    use chrono::TimeZone;
    let at = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
    let nonce = uuid::Uuid::from_u128(0xabcdef12_3456_7890_abcd_ef1234567890);
    assert_eq!(generate_order_id(at, nonce), "ORD-20240301090507-ABCDEF12");
}
