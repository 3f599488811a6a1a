//! Medicine catalogue service

use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{lock_medicine, plan, write_stock};
use crate::services::like_pattern;
use shared::{
    CreateMedicineRequest, Medicine, PaginatedResponse, Pagination, StockFilter, StockMutation,
    UpdateMedicineRequest,
};

const MEDICINE_COLUMNS: &str = "id, code, name, spec, medicine_type, price, stock, manufacturer, \
                                status, created_at, updated_at";

/// Medicine service
#[derive(Clone)]
pub struct MedicineService {
    db: PgPool,
}

impl MedicineService {
    /// Create a new MedicineService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a medicine. A non-zero opening stock goes through the ledger so the
    /// movement history replays to the stored stock.
    pub async fn create(&self, actor: i64, input: &CreateMedicineRequest) -> AppResult<Medicine> {
        let mut tx = self.db.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO medicines (code, name, spec, medicine_type, price, stock, manufacturer, status)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(input.spec.trim())
        .bind(input.medicine_type)
        .bind(input.price)
        .bind(input.manufacturer.trim())
        .bind(input.status.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await?;

        if input.stock > 0 {
            let locked = lock_medicine(&mut tx, id).await?;
            let mutation = StockMutation::Opening {
                quantity: input.stock,
            };
            let change = plan(&locked, mutation)?;
            write_stock(&mut tx, id, mutation.kind(), change, None, None, actor).await?;
        }

        let medicine = sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(medicine_id = id, code = %medicine.code, "Medicine created");

        Ok(medicine)
    }

    /// Update descriptive fields and price. Stock is only ever changed by the ledger.
    pub async fn update(&self, id: i64, input: &UpdateMedicineRequest) -> AppResult<Medicine> {
        sqlx::query_as::<_, Medicine>(&format!(
            r#"
            UPDATE medicines SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                spec = COALESCE($4, spec),
                medicine_type = COALESCE($5, medicine_type),
                price = COALESCE($6, price),
                manufacturer = COALESCE($7, manufacturer),
                status = COALESCE($8, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.code.as_deref().map(str::trim))
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.spec.as_deref().map(str::trim))
        .bind(input.medicine_type)
        .bind(input.price)
        .bind(input.manufacturer.as_deref().map(str::trim))
        .bind(input.status)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))
    }

    /// Delete a medicine that no inbound or sale refers to
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM inbounds WHERE medicine_id = $1)
                OR EXISTS(SELECT 1 FROM sales WHERE medicine_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::conflict(
                "medicine",
                "Medicine has inbound or sale records and cannot be deleted",
                "该药品存在入库或销售记录，无法删除",
            ));
        }

        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Medicine".to_string()));
        }
        tracing::info!(medicine_id = id, "Medicine deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> AppResult<Medicine> {
        sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))
    }

    /// List medicines. `search` matches name or code; `filter` narrows to low or empty stock.
    pub async fn list(
        &self,
        search: Option<&str>,
        filter: Option<StockFilter>,
        low_stock_threshold: i32,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Medicine>> {
        let pattern = like_pattern(search);
        let low_only = filter == Some(StockFilter::LowStock);
        let empty_only = filter == Some(StockFilter::OutOfStock);
        let condition = "WHERE ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1) \
                         AND (NOT $2 OR stock < $3) \
                         AND (NOT $4 OR stock = 0)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM medicines {condition}"
        ))
        .bind(&pattern)
        .bind(low_only)
        .bind(low_stock_threshold)
        .bind(empty_only)
        .fetch_one(&self.db)
        .await?;

        let medicines = sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines {condition} ORDER BY id ASC \
             LIMIT $5 OFFSET $6"
        ))
        .bind(&pattern)
        .bind(low_only)
        .bind(low_stock_threshold)
        .bind(empty_only)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(medicines, pagination, total))
    }
}
