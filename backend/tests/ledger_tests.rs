//! Stock ledger tests
//!
//! Tests for stock mutation rules including:
//! - Stock never goes negative and rejections leave it untouched
//! - Edits and deletes reverse the original delta exactly
//! - The movement trail replays to the stored stock

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    line_total, replay, require_reason, LedgerEntry, LedgerError, MovementKind, RecordKind,
    ReplayCheck, StockChange, StockMutation, StoredRecord,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn stored(kind: RecordKind, quantity: i32, unit_price: &str) -> StoredRecord {
    StoredRecord {
        kind,
        quantity,
        unit_price: dec(unit_price),
        returned: false,
    }
}

/// Apply a mutation and return the audit entry it would produce
fn record(stock: &mut i32, mutation: StockMutation) -> Result<LedgerEntry, LedgerError> {
    let change = mutation.apply(*stock)?;
    *stock = change.new;
    Ok(LedgerEntry {
        kind: mutation.kind(),
        delta: change.delta(),
        stock_after: change.new,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Medicine stock=100; a sale of 120 is rejected and stock stays 100
    #[test]
    fn test_oversell_is_rejected_without_mutation() {
        let mut stock = 100;
        let result = record(&mut stock, StockMutation::Sale { quantity: 120 });

        assert_eq!(
            result,
            Err(LedgerError::InsufficientStock {
                available: 100,
                requested: 120
            })
        );
        assert_eq!(stock, 100);
    }

    /// Inbound 50 @ 10 then sale of 20 @ 12 gives stock 30 and a 240 total
    #[test]
    fn test_inbound_then_sale_scenario() {
        let mut stock = 0;
        record(&mut stock, StockMutation::Inbound { quantity: 50 }).unwrap();
        record(&mut stock, StockMutation::Sale { quantity: 20 }).unwrap();

        assert_eq!(stock, 30);
        assert_eq!(line_total(dec("12.00"), 20), dec("240.00"));
    }

    /// Adjusting to 0 then receiving 20 leaves exactly 20
    #[test]
    fn test_adjust_then_inbound() {
        let mut stock = 73;
        record(&mut stock, StockMutation::Adjust { new_stock: 0 }).unwrap();
        record(&mut stock, StockMutation::Inbound { quantity: 20 }).unwrap();
        assert_eq!(stock, 20);
    }

    /// Editing an inbound from 10 to 15 moves stock by +5 even after unrelated sales
    #[test]
    fn test_inbound_edit_applies_net_delta() {
        let mut stock = 0;
        record(&mut stock, StockMutation::Inbound { quantity: 10 }).unwrap();
        record(&mut stock, StockMutation::Inbound { quantity: 40 }).unwrap();
        record(&mut stock, StockMutation::Sale { quantity: 33 }).unwrap();
        let before = stock;

        let entry = record(
            &mut stock,
            StockMutation::InboundEdit {
                old_quantity: 10,
                new_quantity: 15,
            },
        )
        .unwrap();

        assert_eq!(entry.delta, 5);
        assert_eq!(stock, before + 5);
    }

    /// Shrinking an inbound whose stock was already sold is refused
    #[test]
    fn test_inbound_edit_cannot_drive_stock_negative() {
        let mut stock = 0;
        record(&mut stock, StockMutation::Inbound { quantity: 10 }).unwrap();
        record(&mut stock, StockMutation::Sale { quantity: 8 }).unwrap();

        let result = record(
            &mut stock,
            StockMutation::InboundEdit {
                old_quantity: 10,
                new_quantity: 1,
            },
        );
        assert!(matches!(result, Err(LedgerError::InsufficientStock { .. })));
        assert_eq!(stock, 2);
    }

    /// Deleting a sale restores exactly what it deducted
    #[test]
    fn test_sale_delete_restores_quantity() {
        let mut stock = 0;
        record(&mut stock, StockMutation::Inbound { quantity: 30 }).unwrap();
        record(&mut stock, StockMutation::Sale { quantity: 12 }).unwrap();
        record(&mut stock, StockMutation::SaleDelete { quantity: 12 }).unwrap();
        assert_eq!(stock, 30);
    }

    /// Growing a sale needs enough stock for the difference only
    #[test]
    fn test_sale_edit_checks_difference() {
        let mut stock = 0;
        record(&mut stock, StockMutation::Inbound { quantity: 10 }).unwrap();
        record(&mut stock, StockMutation::Sale { quantity: 8 }).unwrap();

        record(
            &mut stock,
            StockMutation::SaleEdit {
                old_quantity: 8,
                new_quantity: 10,
            },
        )
        .unwrap();
        assert_eq!(stock, 0);

        let result = record(
            &mut stock,
            StockMutation::SaleEdit {
                old_quantity: 10,
                new_quantity: 11,
            },
        );
        assert!(result.is_err());
        assert_eq!(stock, 0);
    }

    /// A purchase return of consumed stock is refused
    #[test]
    fn test_purchase_return_needs_stock_on_hand() {
        let mut stock = 0;
        record(&mut stock, StockMutation::Inbound { quantity: 20 }).unwrap();
        record(&mut stock, StockMutation::Sale { quantity: 15 }).unwrap();

        let result = record(&mut stock, StockMutation::PurchaseReturn { quantity: 20 });
        assert_eq!(
            result,
            Err(LedgerError::InsufficientStock {
                available: 5,
                requested: 20
            })
        );
        assert_eq!(stock, 5);
    }

    /// Sales returns always add back
    #[test]
    fn test_sales_return_always_adds() {
        let mut stock = 0;
        record(&mut stock, StockMutation::SalesReturn { quantity: 4 }).unwrap();
        assert_eq!(stock, 4);
    }

    #[test]
    fn test_non_positive_quantities_are_validation_errors() {
        for mutation in [
            StockMutation::Inbound { quantity: 0 },
            StockMutation::Sale { quantity: -1 },
            StockMutation::PurchaseReturn { quantity: 0 },
            StockMutation::Adjust { new_stock: -3 },
        ] {
            assert!(
                matches!(mutation.apply(10), Err(LedgerError::Validation { .. })),
                "{mutation:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reason_must_not_be_blank() {
        assert_eq!(require_reason("  damaged  ").unwrap(), "damaged");
        assert!(require_reason(" \t ").is_err());
    }

    #[test]
    fn test_adjustment_records_both_counts() {
        let change = StockMutation::Adjust { new_stock: 7 }.apply(12).unwrap();
        assert_eq!(change, StockChange { previous: 12, new: 7 });
        assert_eq!(change.delta(), -5);
    }

    /// Sold 10 @ 12.00; the medicine is repriced to 15.00 before the edit to 12
    #[test]
    fn test_sale_edit_uses_captured_price() {
        let sale = stored(RecordKind::Sale, 10, "12.00");
        let current_medicine_price = dec("15.00");

        let edit = sale.edit(12, Some(current_medicine_price)).unwrap();

        assert_eq!(edit.unit_price, dec("12.00"));
        assert_eq!(edit.total_price, dec("144.00"));
        assert_eq!(
            edit.mutation,
            StockMutation::SaleEdit {
                old_quantity: 10,
                new_quantity: 12
            }
        );
    }

    #[test]
    fn test_inbound_edit_may_change_price() {
        let inbound = stored(RecordKind::Inbound, 50, "10.00");

        let kept = inbound.edit(40, None).unwrap();
        assert_eq!(kept.unit_price, dec("10.00"));
        assert_eq!(kept.mutation.apply(50).unwrap().new, 40);

        let repriced = inbound.edit(40, Some(dec("9.50"))).unwrap();
        assert_eq!(repriced.unit_price, dec("9.50"));
        assert_eq!(repriced.total_price, dec("380.00"));
    }

    #[test]
    fn test_edit_to_zero_quantity_is_rejected() {
        let sale = stored(RecordKind::Sale, 3, "1.00");
        assert!(matches!(
            sale.edit(0, None),
            Err(LedgerError::Validation { field: "quantity", .. })
        ));
    }

    /// Returned records are frozen: no edit, no delete, no second return
    #[test]
    fn test_returned_record_is_frozen() {
        for kind in [RecordKind::Inbound, RecordKind::Sale] {
            let mut record = stored(kind, 5, "2.00");
            assert!(record.return_all().is_ok());

            record.returned = true;
            let expected = Err(LedgerError::AlreadyReturned { record: kind });
            assert_eq!(record.edit(6, None).map(|e| e.mutation), expected);
            assert_eq!(record.delete(), expected);
            assert_eq!(record.return_all(), expected);
        }
    }

    #[test]
    fn test_return_and_delete_reverse_the_record() {
        let inbound = stored(RecordKind::Inbound, 20, "4.00");
        assert_eq!(
            inbound.return_all().unwrap(),
            StockMutation::PurchaseReturn { quantity: 20 }
        );
        assert_eq!(inbound.delete().unwrap(), StockMutation::InboundDelete { quantity: 20 });

        let sale = stored(RecordKind::Sale, 7, "4.00");
        assert_eq!(sale.return_all().unwrap(), StockMutation::SalesReturn { quantity: 7 });
        assert_eq!(sale.delete().unwrap(), StockMutation::SaleDelete { quantity: 7 });
    }

    #[test]
    fn test_replay_of_tampered_trail_is_inconsistent() {
        let entries = vec![
            LedgerEntry {
                kind: MovementKind::Inbound,
                delta: 10,
                stock_after: 10,
            },
            LedgerEntry {
                kind: MovementKind::Sale,
                delta: -4,
                stock_after: 6,
            },
        ];
        let check = ReplayCheck::run(entries.clone(), 6);
        assert!(check.consistent);

        let check = ReplayCheck::run(entries, 9);
        assert_eq!(check.replayed_stock, Some(6));
        assert!(!check.consistent);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn mutation_strategy() -> impl Strategy<Value = StockMutation> {
    prop_oneof![
        (1..200i32).prop_map(|quantity| StockMutation::Inbound { quantity }),
        (1..200i32).prop_map(|quantity| StockMutation::Sale { quantity }),
        (0..300i32).prop_map(|new_stock| StockMutation::Adjust { new_stock }),
        (1..200i32).prop_map(|quantity| StockMutation::PurchaseReturn { quantity }),
        (1..200i32).prop_map(|quantity| StockMutation::SalesReturn { quantity }),
        (1..200i32, 1..200i32).prop_map(|(old_quantity, new_quantity)| {
            StockMutation::InboundEdit {
                old_quantity,
                new_quantity,
            }
        }),
        (1..200i32, 1..200i32).prop_map(|(old_quantity, new_quantity)| {
            StockMutation::SaleEdit {
                old_quantity,
                new_quantity,
            }
        }),
    ]
}

proptest! {
    /// Stock never goes negative, whatever sequence is attempted
    #[test]
    fn prop_stock_never_negative(
        mutations in prop::collection::vec(mutation_strategy(), 0..60)
    ) {
        let mut stock = 0;
        for mutation in mutations {
            let _ = record(&mut stock, mutation);
            prop_assert!(stock >= 0);
        }
    }

    /// A rejected mutation leaves stock exactly where it was
    #[test]
    fn prop_rejection_is_side_effect_free(
        start in 0..500i32,
        mutation in mutation_strategy()
    ) {
        let mut stock = start;
        if record(&mut stock, mutation).is_err() {
            prop_assert_eq!(stock, start);
        }
    }

    /// Replaying the accepted trail reproduces the final stock
    #[test]
    fn prop_replay_reproduces_stock(
        mutations in prop::collection::vec(mutation_strategy(), 0..60)
    ) {
        let mut stock = 0;
        let trail: Vec<LedgerEntry> = mutations
            .into_iter()
            .filter_map(|m| record(&mut stock, m).ok())
            .collect();

        prop_assert_eq!(replay(trail.clone()), Some(stock));
        prop_assert!(ReplayCheck::run(trail, stock).consistent);
    }

    /// Without adjustments the final stock is the signed sum of accepted deltas
    #[test]
    fn prop_stock_is_sum_of_deltas(
        ops in prop::collection::vec((any::<bool>(), 1..100i32), 0..50)
    ) {
        let mut stock = 0;
        let mut expected = 0i64;
        for (incoming, quantity) in ops {
            let mutation = if incoming {
                StockMutation::Inbound { quantity }
            } else {
                StockMutation::Sale { quantity }
            };
            if let Ok(entry) = record(&mut stock, mutation) {
                expected += i64::from(entry.delta);
            }
        }
        prop_assert_eq!(i64::from(stock), expected);
    }

    /// An edit followed by deleting the edited record equals deleting the original
    #[test]
    fn prop_inbound_edit_then_delete_cancels(
        base in 0..100i32,
        old_quantity in 1..100i32,
        new_quantity in 1..100i32
    ) {
        let mut stock = base;
        record(&mut stock, StockMutation::Inbound { quantity: old_quantity }).unwrap();
        record(&mut stock, StockMutation::InboundEdit { old_quantity, new_quantity }).unwrap();
        record(&mut stock, StockMutation::InboundDelete { quantity: new_quantity }).unwrap();
        prop_assert_eq!(stock, base);
    }

    /// A sale edit total never depends on a later medicine price
    #[test]
    fn prop_sale_edit_total_ignores_current_price(
        sold_cents in 1i64..100_000,
        current_cents in 1i64..100_000,
        old_quantity in 1..500i32,
        new_quantity in 1..500i32
    ) {
        let sale = StoredRecord {
            kind: RecordKind::Sale,
            quantity: old_quantity,
            unit_price: Decimal::new(sold_cents, 2),
            returned: false,
        };
        let edit = sale.edit(new_quantity, Some(Decimal::new(current_cents, 2))).unwrap();
        prop_assert_eq!(edit.total_price, line_total(Decimal::new(sold_cents, 2), new_quantity));
    }

    /// Line totals are rounded to cents
    #[test]
    fn prop_line_total_has_two_decimals(cents in 0i64..1_000_000, quantity in 1..1000i32) {
        let total = line_total(Decimal::new(cents, 2), quantity);
        prop_assert!(total.scale() <= 2);
        prop_assert_eq!(total, Decimal::new(cents, 2) * Decimal::from(quantity));
    }
}
