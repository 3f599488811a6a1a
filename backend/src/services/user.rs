//! User account management

use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;
use crate::services::like_pattern;
use shared::{CreateUserRequest, PaginatedResponse, Pagination, Role, UpdateUserRequest, User};

const USER_COLUMNS: &str = "id, username, real_name, phone, role, created_at, updated_at";

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &CreateUserRequest) -> AppResult<User> {
        let password_hash = hash_password(&input.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, real_name, phone, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(input.username.trim())
        .bind(&password_hash)
        .bind(input.real_name.trim())
        .bind(input.phone.trim())
        .bind(input.role)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    /// Partial update. An empty password keeps the stored hash.
    pub async fn update(&self, id: i64, input: &UpdateUserRequest) -> AppResult<User> {
        let password_hash = input.new_password().map(hash_password).transpose()?;

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                real_name = COALESCE($4, real_name),
                phone = COALESCE($5, phone),
                role = COALESCE($6, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.username.as_deref().map(str::trim))
        .bind(password_hash)
        .bind(input.real_name.as_deref().map(str::trim))
        .bind(input.phone.as_deref().map(str::trim))
        .bind(input.role)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Admins cannot delete their own account
    pub async fn delete(&self, actor: i64, id: i64) -> AppResult<()> {
        if actor == id {
            return Err(AppError::invalid(
                "id",
                "You cannot delete your own account",
                "不能删除当前登录的账号",
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        tracing::info!(user_id = id, deleted_by = actor, "User deleted");
        Ok(())
    }

    pub async fn list(&self, pagination: &Pagination) -> AppResult<PaginatedResponse<User>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit_i64())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(users, pagination, total))
    }

    /// Match username, real name or phone
    pub async fn search(&self, keyword: Option<&str>) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR username ILIKE $1 OR real_name ILIKE $1 OR phone ILIKE $1) \
             ORDER BY id ASC LIMIT 50"
        ))
        .bind(like_pattern(keyword))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    /// Current role of an account; `None` once it has been deleted
    pub async fn role_of(&self, id: i64) -> AppResult<Option<Role>> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(role)
    }
}
