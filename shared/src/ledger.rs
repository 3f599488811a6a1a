//! Stock ledger arithmetic
//!
//! Every quantity-changing operation on a medicine is expressed as a
//! [`StockMutation`]: compute the signed delta, check that the resulting stock
//! stays non-negative, and hand back the [`StockChange`] to persist. The
//! backend runs this inside a transaction holding the medicine row lock and
//! writes the new stock and its audit row together.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MovementKind, StockMovement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("stock quantity out of range")]
    Overflow,

    #[error("{record} has already been returned")]
    AlreadyReturned { record: RecordKind },
}

impl LedgerError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Stock before and after one mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub previous: i32,
    pub new: i32,
}

impl StockChange {
    pub fn delta(&self) -> i32 {
        self.new - self.previous
    }
}

/// A single quantity-changing operation against one medicine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockMutation {
    /// Opening balance of a newly created medicine
    Opening { quantity: i32 },
    Inbound { quantity: i32 },
    Sale { quantity: i32 },
    /// Count correction: stock is set to `new_stock` regardless of its current value
    Adjust { new_stock: i32 },
    PurchaseReturn { quantity: i32 },
    SalesReturn { quantity: i32 },
    InboundEdit { old_quantity: i32, new_quantity: i32 },
    InboundDelete { quantity: i32 },
    SaleEdit { old_quantity: i32, new_quantity: i32 },
    SaleDelete { quantity: i32 },
}

impl StockMutation {
    pub fn kind(&self) -> MovementKind {
        match self {
            StockMutation::Opening { .. } => MovementKind::Opening,
            StockMutation::Inbound { .. } => MovementKind::Inbound,
            StockMutation::Sale { .. } => MovementKind::Sale,
            StockMutation::Adjust { .. } => MovementKind::Adjustment,
            StockMutation::PurchaseReturn { .. } => MovementKind::PurchaseReturn,
            StockMutation::SalesReturn { .. } => MovementKind::SalesReturn,
            StockMutation::InboundEdit { .. } => MovementKind::InboundEdit,
            StockMutation::InboundDelete { .. } => MovementKind::InboundDelete,
            StockMutation::SaleEdit { .. } => MovementKind::SaleEdit,
            StockMutation::SaleDelete { .. } => MovementKind::SaleDelete,
        }
    }

    /// Apply to the current stock. On error the caller must leave stock untouched.
    ///
    /// Edits are checked on their net effect only: reversing the old quantity
    /// and applying the new one is a single step.
    pub fn apply(&self, stock: i32) -> LedgerResult<StockChange> {
        match *self {
            StockMutation::Opening { quantity } => {
                non_negative("stock", quantity)?;
                apply_delta(stock, quantity)
            }
            StockMutation::Inbound { quantity } | StockMutation::SalesReturn { quantity } => {
                positive("quantity", quantity)?;
                apply_delta(stock, quantity)
            }
            StockMutation::Sale { quantity }
            | StockMutation::PurchaseReturn { quantity }
            | StockMutation::InboundDelete { quantity } => {
                positive("quantity", quantity)?;
                apply_delta(stock, negate(quantity)?)
            }
            StockMutation::SaleDelete { quantity } => {
                positive("quantity", quantity)?;
                apply_delta(stock, quantity)
            }
            StockMutation::Adjust { new_stock } => {
                non_negative("new_stock", new_stock)?;
                Ok(StockChange {
                    previous: stock,
                    new: new_stock,
                })
            }
            StockMutation::InboundEdit {
                old_quantity,
                new_quantity,
            } => {
                positive("quantity", new_quantity)?;
                let delta = new_quantity
                    .checked_sub(old_quantity)
                    .ok_or(LedgerError::Overflow)?;
                apply_delta(stock, delta)
            }
            StockMutation::SaleEdit {
                old_quantity,
                new_quantity,
            } => {
                positive("quantity", new_quantity)?;
                let delta = old_quantity
                    .checked_sub(new_quantity)
                    .ok_or(LedgerError::Overflow)?;
                apply_delta(stock, delta)
            }
        }
    }
}

/// Apply a signed delta, refusing to go below zero
pub fn apply_delta(stock: i32, delta: i32) -> LedgerResult<StockChange> {
    let new = stock.checked_add(delta).ok_or(LedgerError::Overflow)?;
    if new < 0 {
        return Err(LedgerError::InsufficientStock {
            available: stock,
            requested: delta.saturating_neg(),
        });
    }
    Ok(StockChange {
        previous: stock,
        new,
    })
}

/// Trimmed, non-empty reason for adjustments and returns
pub fn require_reason(reason: &str) -> LedgerResult<&str> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation("reason", "reason is required"));
    }
    Ok(trimmed)
}

/// `quantity × unit_price`, rounded half-up to cents
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    (unit_price * Decimal::from(quantity))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Stored records
// ============================================================================

/// Records whose quantity can later be edited, deleted or returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Inbound,
    Sale,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Inbound => "Inbound record",
            RecordKind::Sale => "Sale record",
        }
    }

    pub fn label_zh(&self) -> &'static str {
        match self {
            RecordKind::Inbound => "入库记录",
            RecordKind::Sale => "销售记录",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An inbound or sale row as read under its row lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredRecord {
    pub kind: RecordKind,
    pub quantity: i32,
    /// Price captured when the record was written
    pub unit_price: Decimal,
    pub returned: bool,
}

/// What an edit writes back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEdit {
    pub mutation: StockMutation,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl StoredRecord {
    /// Change the quantity. An inbound may also take a new unit price; a sale
    /// always keeps the price it was sold at and `new_unit_price` is ignored.
    pub fn edit(&self, new_quantity: i32, new_unit_price: Option<Decimal>) -> LedgerResult<RecordEdit> {
        self.ensure_open()?;
        positive("quantity", new_quantity)?;

        let old_quantity = self.quantity;
        let (mutation, unit_price) = match self.kind {
            RecordKind::Inbound => (
                StockMutation::InboundEdit {
                    old_quantity,
                    new_quantity,
                },
                new_unit_price.unwrap_or(self.unit_price),
            ),
            RecordKind::Sale => (
                StockMutation::SaleEdit {
                    old_quantity,
                    new_quantity,
                },
                self.unit_price,
            ),
        };

        Ok(RecordEdit {
            mutation,
            unit_price,
            total_price: line_total(unit_price, new_quantity),
        })
    }

    /// Reverse the record's original effect on stock
    pub fn delete(&self) -> LedgerResult<StockMutation> {
        self.ensure_open()?;
        let quantity = self.quantity;
        Ok(match self.kind {
            RecordKind::Inbound => StockMutation::InboundDelete { quantity },
            RecordKind::Sale => StockMutation::SaleDelete { quantity },
        })
    }

    /// Return the whole record. Only allowed once.
    pub fn return_all(&self) -> LedgerResult<StockMutation> {
        self.ensure_open()?;
        let quantity = self.quantity;
        Ok(match self.kind {
            RecordKind::Inbound => StockMutation::PurchaseReturn { quantity },
            RecordKind::Sale => StockMutation::SalesReturn { quantity },
        })
    }

    fn ensure_open(&self) -> LedgerResult<()> {
        if self.returned {
            return Err(LedgerError::AlreadyReturned { record: self.kind });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: i32) -> LedgerResult<()> {
    if value <= 0 {
        return Err(LedgerError::validation(field, "must be greater than 0"));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: i32) -> LedgerResult<()> {
    if value < 0 {
        return Err(LedgerError::validation(field, "must not be negative"));
    }
    Ok(())
}

fn negate(value: i32) -> LedgerResult<i32> {
    value.checked_neg().ok_or(LedgerError::Overflow)
}

// ============================================================================
// Replay
// ============================================================================

/// The part of a stock movement needed to replay it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: MovementKind,
    pub delta: i32,
    pub stock_after: i32,
}

impl From<&StockMovement> for LedgerEntry {
    fn from(movement: &StockMovement) -> Self {
        LedgerEntry {
            kind: movement.kind,
            delta: movement.delta,
            stock_after: movement.stock_after,
        }
    }
}

/// Rebuild stock from an ordered audit trail, starting at zero.
///
/// Adjustments reset the running total to their recorded value; every other
/// kind adds its delta. Returns `None` if the trail ever goes negative or
/// overflows, which means it was not produced by this ledger.
pub fn replay<I>(entries: I) -> Option<i32>
where
    I: IntoIterator<Item = LedgerEntry>,
{
    entries.into_iter().try_fold(0i32, |stock, entry| {
        let next = if entry.kind.is_absolute() {
            entry.stock_after
        } else {
            stock.checked_add(entry.delta)?
        };
        (next >= 0).then_some(next)
    })
}

/// Outcome of replaying a medicine's audit trail against its stored stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCheck {
    pub replayed_stock: Option<i32>,
    pub current_stock: i32,
    pub consistent: bool,
}

impl ReplayCheck {
    pub fn run<I>(entries: I, current_stock: i32) -> Self
    where
        I: IntoIterator<Item = LedgerEntry>,
    {
        let replayed_stock = replay(entries);
        ReplayCheck {
            replayed_stock,
            current_stock,
            consistent: replayed_stock == Some(current_stock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn entry(mutation: StockMutation, change: StockChange) -> LedgerEntry {
        LedgerEntry {
            kind: mutation.kind(),
            delta: change.delta(),
            stock_after: change.new,
        }
    }

    #[test]
    fn sale_above_stock_is_rejected() {
        let err = StockMutation::Sale { quantity: 120 }.apply(100).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                available: 100,
                requested: 120
            }
        );
    }

    #[test]
    fn sale_of_entire_stock_is_allowed() {
        let change = StockMutation::Sale { quantity: 7 }.apply(7).unwrap();
        assert_eq!(change.new, 0);
        assert_eq!(change.delta(), -7);
    }

    #[test]
    fn zero_quantity_is_a_validation_error() {
        for mutation in [
            StockMutation::Inbound { quantity: 0 },
            StockMutation::Sale { quantity: 0 },
            StockMutation::InboundEdit {
                old_quantity: 5,
                new_quantity: 0,
            },
        ] {
            assert!(matches!(
                mutation.apply(10),
                Err(LedgerError::Validation { field: "quantity", .. })
            ));
        }
    }

    #[test]
    fn adjustment_is_absolute() {
        let change = StockMutation::Adjust { new_stock: 3 }.apply(40).unwrap();
        assert_eq!(change, StockChange { previous: 40, new: 3 });
        assert!(StockMutation::Adjust { new_stock: -1 }.apply(40).is_err());
    }

    #[test]
    fn purchase_return_cannot_take_consumed_stock() {
        let err = StockMutation::PurchaseReturn { quantity: 50 }
            .apply(30)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { available: 30, .. }));
    }

    #[test]
    fn edits_apply_net_difference() {
        let up = StockMutation::InboundEdit {
            old_quantity: 10,
            new_quantity: 15,
        }
        .apply(37)
        .unwrap();
        assert_eq!(up.delta(), 5);

        let sale = StockMutation::SaleEdit {
            old_quantity: 20,
            new_quantity: 25,
        }
        .apply(4)
        .unwrap();
        assert_eq!(sale.new, 0);

        assert!(StockMutation::SaleEdit {
            old_quantity: 20,
            new_quantity: 25,
        }
        .apply(3)
        .is_err());
    }

    #[test]
    fn inbound_delete_after_consumption_is_rejected() {
        assert!(StockMutation::InboundDelete { quantity: 10 }.apply(6).is_err());
        assert_eq!(
            StockMutation::SaleDelete { quantity: 10 }.apply(6).unwrap().new,
            16
        );
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            StockMutation::Inbound { quantity: 1 }.apply(i32::MAX),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn blank_reason_is_rejected() {
        assert!(require_reason("   ").is_err());
        assert_eq!(require_reason(" damaged ").unwrap(), "damaged");
    }

    #[test]
    fn line_total_uses_snapshot_price() {
        let price = Decimal::from_str("12.00").unwrap();
        assert_eq!(line_total(price, 20), Decimal::from_str("240.00").unwrap());
        let odd = Decimal::from_str("0.333").unwrap();
        assert_eq!(line_total(odd, 3), Decimal::from_str("1.00").unwrap());
    }

    #[test]
    fn replay_matches_running_stock() {
        let mutations = [
            StockMutation::Opening { quantity: 10 },
            StockMutation::Inbound { quantity: 50 },
            StockMutation::Sale { quantity: 20 },
            StockMutation::Adjust { new_stock: 0 },
            StockMutation::Inbound { quantity: 20 },
            StockMutation::SalesReturn { quantity: 5 },
        ];
        let mut stock = 0;
        let mut trail = Vec::new();
        for m in mutations {
            let change = m.apply(stock).unwrap();
            trail.push(entry(m, change));
            stock = change.new;
        }
        assert_eq!(stock, 25);
        let check = ReplayCheck::run(trail, stock);
        assert!(check.consistent);
        assert_eq!(check.replayed_stock, Some(25));
    }

    #[test]
    fn replay_detects_drift() {
        let trail = vec![LedgerEntry {
            kind: MovementKind::Inbound,
            delta: 5,
            stock_after: 5,
        }];
        let check = ReplayCheck::run(trail, 9);
        assert!(!check.consistent);
    }
}
