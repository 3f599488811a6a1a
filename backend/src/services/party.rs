//! Customer and supplier service

use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::like_pattern;
use shared::{Customer, CustomerRequest, PaginatedResponse, Pagination, Supplier, SupplierRequest};

/// Unpaginated search results are capped at this many rows
const SEARCH_LIMIT: i64 = 50;

/// Customer and supplier service
#[derive(Clone)]
pub struct PartyService {
    db: PgPool,
}

impl PartyService {
    /// Create a new PartyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub async fn create_customer(&self, input: &CustomerRequest) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (name, phone) VALUES ($1, $2) \
             RETURNING id, name, phone, created_at",
        )
        .bind(input.name.trim())
        .bind(input.phone.trim())
        .fetch_one(&self.db)
        .await?;
        Ok(customer)
    }

    pub async fn update_customer(&self, id: i64, input: &CustomerRequest) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "UPDATE customers SET name = $2, phone = $3 WHERE id = $1 \
             RETURNING id, name, phone, created_at",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.phone.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// Past sales keep their rows; their customer reference becomes null
    pub async fn delete_customer(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }

    pub async fn list_customers(
        &self,
        keyword: Option<&str>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Customer>> {
        let pattern = like_pattern(keyword);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR phone ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, created_at
            FROM customers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR phone ILIKE $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(customers, pagination, total))
    }

    pub async fn search_customers(&self, keyword: Option<&str>) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, created_at
            FROM customers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR phone ILIKE $1)
            ORDER BY name ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(like_pattern(keyword))
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;
        Ok(customers)
    }

    // ========================================================================
    // Suppliers
    // ========================================================================

    pub async fn create_supplier(&self, input: &SupplierRequest) -> AppResult<Supplier> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "INSERT INTO suppliers (name, contact, phone) VALUES ($1, $2, $3) \
             RETURNING id, name, contact, phone, created_at",
        )
        .bind(input.name.trim())
        .bind(input.contact.trim())
        .bind(input.phone.trim())
        .fetch_one(&self.db)
        .await?;
        Ok(supplier)
    }

    pub async fn update_supplier(&self, id: i64, input: &SupplierRequest) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            "UPDATE suppliers SET name = $2, contact = $3, phone = $4 WHERE id = $1 \
             RETURNING id, name, contact, phone, created_at",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.contact.trim())
        .bind(input.phone.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// Suppliers with receipts on file cannot be removed
    pub async fn delete_supplier(&self, id: i64) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inbounds WHERE supplier_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::conflict(
                "supplier",
                "Supplier has inbound records and cannot be deleted",
                "该供应商存在入库记录，无法删除",
            ));
        }

        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }

    pub async fn list_suppliers(
        &self,
        keyword: Option<&str>,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Supplier>> {
        let pattern = like_pattern(keyword);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM suppliers \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR contact ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact, phone, created_at
            FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR contact ILIKE $1)
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(suppliers, pagination, total))
    }

    pub async fn search_suppliers(&self, keyword: Option<&str>) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact, phone, created_at
            FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR contact ILIKE $1)
            ORDER BY name ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(like_pattern(keyword))
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;
        Ok(suppliers)
    }
}
