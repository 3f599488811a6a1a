//! Stock ledger service
//!
//! Every quantity-changing operation runs in one transaction:
//! lock the affected record row, lock the medicine row, compute the change
//! with [`StockMutation::apply`], then write the record, the new stock and a
//! `stock_movements` row before committing. Locks are always taken record
//! first, medicine second.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::like_pattern;
use shared::{
    generate_order_id, line_total, require_reason, AdjustStockRequest, CreateInboundRequest,
    CreateSaleRequest, InboundRecord, InboundView, LedgerEntry, LedgerError, MedicineLedger,
    MedicineType, MovementKind, PaginatedResponse, Pagination, PurchaseReturn,
    PurchaseReturnRequest, RecordKind, ReplayCheck, SaleRecord, SaleView, SalesReturn,
    SalesReturnRequest, StockAdjustment, StockChange, StockMovement, StockMutation,
    StoredRecord, UpdateInboundRequest, UpdateSaleRequest,
};

pub(crate) const INBOUND_VIEW_SELECT: &str = r#"
    SELECT i.id, i.medicine_id, m.code AS medicine_code, m.name AS medicine_name,
           i.supplier_id, s.name AS supplier_name, i.quantity, i.unit_price, i.inbound_date,
           EXISTS (SELECT 1 FROM purchase_returns pr WHERE pr.inbound_id = i.id) AS returned
    FROM inbounds i
    JOIN medicines m ON m.id = i.medicine_id
    JOIN suppliers s ON s.id = i.supplier_id
"#;

pub(crate) const SALE_VIEW_SELECT: &str = r#"
    SELECT s.id, s.order_id, s.medicine_id, m.code AS medicine_code, m.name AS medicine_name,
           m.medicine_type, s.customer_id, c.name AS customer_name, s.quantity, s.unit_price,
           s.total_price, s.sale_date,
           EXISTS (SELECT 1 FROM sales_returns sr WHERE sr.sale_id = s.id) AS returned
    FROM sales s
    JOIN medicines m ON m.id = s.medicine_id
    LEFT JOIN customers c ON c.id = s.customer_id
"#;

const INBOUND_COLUMNS: &str =
    "id, medicine_id, supplier_id, quantity, unit_price, inbound_date, created_by";

const SALE_COLUMNS: &str = "id, order_id, medicine_id, customer_id, quantity, unit_price, \
                            total_price, sale_date, created_by";

/// Medicine row held under `FOR UPDATE`
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LockedMedicine {
    pub id: i64,
    pub stock: i32,
    pub price: Decimal,
}

pub(crate) async fn lock_medicine(conn: &mut PgConnection, id: i64) -> AppResult<LockedMedicine> {
    sqlx::query_as::<_, LockedMedicine>(
        "SELECT id, stock, price FROM medicines WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Medicine".to_string()))
}

/// Pure ledger check against the locked row. Nothing has been written yet,
/// so a rejection leaves stock untouched once the transaction is dropped.
pub(crate) fn plan(medicine: &LockedMedicine, mutation: StockMutation) -> AppResult<StockChange> {
    mutation.apply(medicine.stock).map_err(|err| {
        if let LedgerError::InsufficientStock {
            available,
            requested,
        } = err
        {
            tracing::warn!(
                medicine_id = medicine.id,
                kind = mutation.kind().as_str(),
                available,
                requested,
                "Stock mutation rejected"
            );
        }
        AppError::from(err)
    })
}

/// Persist a planned change: new stock plus its audit row
pub(crate) async fn write_stock(
    conn: &mut PgConnection,
    medicine_id: i64,
    kind: MovementKind,
    change: StockChange,
    reference_id: Option<i64>,
    reason: Option<&str>,
    actor: i64,
) -> AppResult<()> {
    sqlx::query("UPDATE medicines SET stock = $2, updated_at = NOW() WHERE id = $1")
        .bind(medicine_id)
        .bind(change.new)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            medicine_id, kind, reference_id, delta, stock_before, stock_after, reason, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(medicine_id)
    .bind(kind)
    .bind(reference_id)
    .bind(change.delta())
    .bind(change.previous)
    .bind(change.new)
    .bind(reason)
    .bind(actor)
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        medicine_id,
        kind = kind.as_str(),
        delta = change.delta(),
        stock_after = change.new,
        "Stock updated"
    );
    Ok(())
}

async fn ensure_exists(
    conn: &mut PgConnection,
    sql: &'static str,
    id: i64,
    resource: &str,
) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if !exists {
        return Err(AppError::NotFound(resource.to_string()));
    }
    Ok(())
}

/// Stock ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Receive stock from a supplier
    pub async fn create_inbound(
        &self,
        actor: i64,
        input: &CreateInboundRequest,
    ) -> AppResult<InboundRecord> {
        let mut tx = self.db.begin().await?;

        ensure_exists(
            &mut tx,
            "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)",
            input.supplier_id,
            "Supplier",
        )
        .await?;

        let medicine = lock_medicine(&mut tx, input.medicine_id).await?;
        let mutation = StockMutation::Inbound {
            quantity: input.quantity,
        };
        let change = plan(&medicine, mutation)?;

        let record = sqlx::query_as::<_, InboundRecord>(&format!(
            "INSERT INTO inbounds (medicine_id, supplier_id, quantity, unit_price, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {INBOUND_COLUMNS}"
        ))
        .bind(medicine.id)
        .bind(input.supplier_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(&mut tx, medicine.id, mutation.kind(), change, Some(record.id), None, actor)
            .await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Change quantity and/or price of a receipt; stock moves by the net difference
    pub async fn update_inbound(
        &self,
        actor: i64,
        id: i64,
        input: &UpdateInboundRequest,
    ) -> AppResult<InboundRecord> {
        let mut tx = self.db.begin().await?;

        let (existing, stored) = Self::lock_inbound(&mut tx, id).await?;
        let edit = stored.edit(input.quantity, input.unit_price)?;

        let medicine = lock_medicine(&mut tx, existing.medicine_id).await?;
        let mutation = edit.mutation;
        let change = plan(&medicine, mutation)?;

        let record = sqlx::query_as::<_, InboundRecord>(&format!(
            "UPDATE inbounds SET quantity = $2, unit_price = $3 WHERE id = $1 \
             RETURNING {INBOUND_COLUMNS}"
        ))
        .bind(id)
        .bind(input.quantity)
        .bind(edit.unit_price)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(&mut tx, medicine.id, mutation.kind(), change, Some(id), None, actor).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Delete a receipt and take its quantity back out of stock
    pub async fn delete_inbound(&self, actor: i64, id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (existing, stored) = Self::lock_inbound(&mut tx, id).await?;
        let mutation = stored.delete()?;

        let medicine = lock_medicine(&mut tx, existing.medicine_id).await?;
        let change = plan(&medicine, mutation)?;

        sqlx::query("DELETE FROM inbounds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        write_stock(&mut tx, medicine.id, mutation.kind(), change, Some(id), None, actor).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn get_inbound(&self, id: i64) -> AppResult<InboundView> {
        sqlx::query_as::<_, InboundView>(&format!("{INBOUND_VIEW_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Inbound record".to_string()))
    }

    /// List receipts, newest first. `keyword` matches medicine name/code or supplier name.
    pub async fn list_inbounds(
        &self,
        keyword: Option<&str>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<InboundView>> {
        let pattern = like_pattern(keyword);
        let filter = "WHERE ($1::text IS NULL OR m.name ILIKE $1 OR m.code ILIKE $1 \
                      OR s.name ILIKE $1)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM inbounds i \
             JOIN medicines m ON m.id = i.medicine_id \
             JOIN suppliers s ON s.id = i.supplier_id {filter}"
        ))
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let records = sqlx::query_as::<_, InboundView>(&format!(
            "{INBOUND_VIEW_SELECT} {filter} ORDER BY i.inbound_date DESC, i.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(records, pagination, total))
    }

    /// Lock a receipt row and read whether it was already returned
    async fn lock_inbound(
        conn: &mut PgConnection,
        id: i64,
    ) -> AppResult<(InboundRecord, StoredRecord)> {
        let record = sqlx::query_as::<_, InboundRecord>(&format!(
            "SELECT {INBOUND_COLUMNS} FROM inbounds WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Inbound record".to_string()))?;

        let returned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_returns WHERE inbound_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        let stored = StoredRecord {
            kind: RecordKind::Inbound,
            quantity: record.quantity,
            unit_price: record.unit_price,
            returned,
        };
        Ok((record, stored))
    }

    // ========================================================================
    // Sales
    // ========================================================================

    /// Sell from stock at the medicine's current price
    pub async fn create_sale(&self, actor: i64, input: &CreateSaleRequest) -> AppResult<SaleRecord> {
        let mut tx = self.db.begin().await?;

        let customer_id = input.customer();
        if let Some(customer_id) = customer_id {
            ensure_exists(
                &mut tx,
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)",
                customer_id,
                "Customer",
            )
            .await?;
        }

        let medicine = lock_medicine(&mut tx, input.medicine_id).await?;
        let mutation = StockMutation::Sale {
            quantity: input.quantity,
        };
        let change = plan(&medicine, mutation)?;

        let total_price = line_total(medicine.price, input.quantity);
        let order_id = generate_order_id(Utc::now(), Uuid::new_v4());

        let record = sqlx::query_as::<_, SaleRecord>(&format!(
            "INSERT INTO sales (order_id, medicine_id, customer_id, quantity, unit_price, \
             total_price, created_by) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(&order_id)
        .bind(medicine.id)
        .bind(customer_id)
        .bind(input.quantity)
        .bind(medicine.price)
        .bind(total_price)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(&mut tx, medicine.id, mutation.kind(), change, Some(record.id), None, actor)
            .await?;
        tx.commit().await?;

        tracing::info!(order_id = %record.order_id, total_price = %record.total_price, "Sale recorded");
        Ok(record)
    }

    /// Change the sold quantity. The total is recomputed from the price captured at sale time.
    pub async fn update_sale(
        &self,
        actor: i64,
        id: i64,
        input: &UpdateSaleRequest,
    ) -> AppResult<SaleRecord> {
        let mut tx = self.db.begin().await?;

        let (existing, stored) = Self::lock_sale(&mut tx, id).await?;
        let edit = stored.edit(input.quantity, None)?;

        let medicine = lock_medicine(&mut tx, existing.medicine_id).await?;
        let mutation = edit.mutation;
        let change = plan(&medicine, mutation)?;

        let record = sqlx::query_as::<_, SaleRecord>(&format!(
            "UPDATE sales SET quantity = $2, total_price = $3 WHERE id = $1 \
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(id)
        .bind(input.quantity)
        .bind(edit.total_price)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(&mut tx, medicine.id, mutation.kind(), change, Some(id), None, actor).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Delete a sale and restore the quantity it deducted
    pub async fn delete_sale(&self, actor: i64, id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (existing, stored) = Self::lock_sale(&mut tx, id).await?;
        let mutation = stored.delete()?;

        let medicine = lock_medicine(&mut tx, existing.medicine_id).await?;
        let change = plan(&medicine, mutation)?;

        sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        write_stock(&mut tx, medicine.id, mutation.kind(), change, Some(id), None, actor).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn get_sale(&self, id: i64) -> AppResult<SaleView> {
        sqlx::query_as::<_, SaleView>(&format!("{SALE_VIEW_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale record".to_string()))
    }

    /// List sales, newest first. `keyword` matches order number, medicine name/code or
    /// customer name; `medicine_type` keeps one dispensing class.
    pub async fn list_sales(
        &self,
        keyword: Option<&str>,
        medicine_type: Option<MedicineType>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<SaleView>> {
        let pattern = like_pattern(keyword);
        let filter = "WHERE ($1::text IS NULL OR s.order_id ILIKE $1 OR m.name ILIKE $1 \
                      OR m.code ILIKE $1 OR c.name ILIKE $1) \
                      AND ($2::medicine_type IS NULL OR m.medicine_type = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM sales s \
             JOIN medicines m ON m.id = s.medicine_id \
             LEFT JOIN customers c ON c.id = s.customer_id {filter}"
        ))
        .bind(&pattern)
        .bind(medicine_type)
        .fetch_one(&self.db)
        .await?;

        let records = sqlx::query_as::<_, SaleView>(&format!(
            "{SALE_VIEW_SELECT} {filter} ORDER BY s.sale_date DESC, s.id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(&pattern)
        .bind(medicine_type)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(records, pagination, total))
    }

    /// Lock a sale row and read whether it was already returned
    async fn lock_sale(conn: &mut PgConnection, id: i64) -> AppResult<(SaleRecord, StoredRecord)> {
        let record = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale record".to_string()))?;

        let returned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sales_returns WHERE sale_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        let stored = StoredRecord {
            kind: RecordKind::Sale,
            quantity: record.quantity,
            unit_price: record.unit_price,
            returned,
        };
        Ok((record, stored))
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// Set stock to a counted value and record why
    pub async fn adjust_stock(
        &self,
        actor: i64,
        input: &AdjustStockRequest,
    ) -> AppResult<StockAdjustment> {
        let reason = require_reason(&input.reason)?;
        let mut tx = self.db.begin().await?;

        let medicine = lock_medicine(&mut tx, input.medicine_id).await?;
        let mutation = StockMutation::Adjust {
            new_stock: input.new_stock,
        };
        let change = plan(&medicine, mutation)?;

        let adjustment = sqlx::query_as::<_, StockAdjustment>(
            r#"
            INSERT INTO stock_adjustments (medicine_id, previous_stock, new_stock, reason, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, medicine_id, previous_stock, new_stock, reason, created_by, created_at
            "#,
        )
        .bind(medicine.id)
        .bind(change.previous)
        .bind(change.new)
        .bind(reason)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(
            &mut tx,
            medicine.id,
            mutation.kind(),
            change,
            Some(adjustment.id),
            Some(reason),
            actor,
        )
        .await?;
        tx.commit().await?;

        Ok(adjustment)
    }

    pub async fn list_adjustments(
        &self,
        medicine_id: Option<i64>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<StockAdjustment>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_adjustments WHERE ($1::bigint IS NULL OR medicine_id = $1)",
        )
        .bind(medicine_id)
        .fetch_one(&self.db)
        .await?;

        let records = sqlx::query_as::<_, StockAdjustment>(
            r#"
            SELECT id, medicine_id, previous_stock, new_stock, reason, created_by, created_at
            FROM stock_adjustments
            WHERE ($1::bigint IS NULL OR medicine_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(medicine_id)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(records, pagination, total))
    }

    // ========================================================================
    // Returns
    // ========================================================================

    /// Send a receipt back to the supplier. Fails if the stock was already consumed.
    pub async fn return_purchase(
        &self,
        actor: i64,
        input: &PurchaseReturnRequest,
    ) -> AppResult<PurchaseReturn> {
        let reason = require_reason(&input.reason)?;
        let mut tx = self.db.begin().await?;

        let (inbound, stored) = Self::lock_inbound(&mut tx, input.inbound_id).await?;
        let mutation = stored.return_all()?;

        let medicine = lock_medicine(&mut tx, inbound.medicine_id).await?;
        let change = plan(&medicine, mutation)?;

        let record = sqlx::query_as::<_, PurchaseReturn>(
            r#"
            INSERT INTO purchase_returns (inbound_id, medicine_id, quantity, reason, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, inbound_id, medicine_id, quantity, reason, created_by, created_at
            "#,
        )
        .bind(inbound.id)
        .bind(medicine.id)
        .bind(inbound.quantity)
        .bind(reason)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(
            &mut tx,
            medicine.id,
            mutation.kind(),
            change,
            Some(record.id),
            Some(reason),
            actor,
        )
        .await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Take sold goods back; stock always rises by the sold quantity
    pub async fn return_sale(
        &self,
        actor: i64,
        input: &SalesReturnRequest,
    ) -> AppResult<SalesReturn> {
        let reason = require_reason(&input.reason)?;
        let mut tx = self.db.begin().await?;

        let (sale, stored) = Self::lock_sale(&mut tx, input.sale_id).await?;
        let mutation = stored.return_all()?;

        let medicine = lock_medicine(&mut tx, sale.medicine_id).await?;
        let change = plan(&medicine, mutation)?;

        let record = sqlx::query_as::<_, SalesReturn>(
            r#"
            INSERT INTO sales_returns (sale_id, medicine_id, quantity, refund_amount, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sale_id, medicine_id, quantity, refund_amount, reason, created_by, created_at
            "#,
        )
        .bind(sale.id)
        .bind(medicine.id)
        .bind(sale.quantity)
        .bind(sale.total_price)
        .bind(reason)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        write_stock(
            &mut tx,
            medicine.id,
            mutation.kind(),
            change,
            Some(record.id),
            Some(reason),
            actor,
        )
        .await?;
        tx.commit().await?;

        Ok(record)
    }

    pub async fn list_purchase_returns(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<PurchaseReturn>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_returns")
            .fetch_one(&self.db)
            .await?;

        let records = sqlx::query_as::<_, PurchaseReturn>(
            r#"
            SELECT id, inbound_id, medicine_id, quantity, reason, created_by, created_at
            FROM purchase_returns
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(records, pagination, total))
    }

    pub async fn list_sales_returns(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<SalesReturn>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales_returns")
            .fetch_one(&self.db)
            .await?;

        let records = sqlx::query_as::<_, SalesReturn>(
            r#"
            SELECT id, sale_id, medicine_id, quantity, refund_amount, reason, created_by, created_at
            FROM sales_returns
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(records, pagination, total))
    }

    // ========================================================================
    // Audit trail
    // ========================================================================

    /// Full movement history of a medicine and whether replaying it matches stored stock
    pub async fn movements(&self, medicine_id: i64) -> AppResult<MedicineLedger> {
        let current_stock =
            sqlx::query_scalar::<_, i32>("SELECT stock FROM medicines WHERE id = $1")
                .bind(medicine_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, medicine_id, kind, reference_id, delta, stock_before, stock_after,
                   reason, created_by, created_at
            FROM stock_movements
            WHERE medicine_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(medicine_id)
        .fetch_all(&self.db)
        .await?;

        let check = ReplayCheck::run(movements.iter().map(LedgerEntry::from), current_stock);
        if !check.consistent {
            tracing::warn!(
                medicine_id,
                current_stock,
                replayed_stock = ?check.replayed_stock,
                "Stock does not match its movement history"
            );
        }

        Ok(MedicineLedger {
            medicine_id,
            movements,
            check,
        })
    }
}
