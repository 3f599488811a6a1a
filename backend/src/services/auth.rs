//! Authentication service for login and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::{LoginRequest, Role, User};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct TokenKeys {
    secret: String,
    expiry_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: impl Into<String>, expiry_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt.secret.clone(), config.jwt.access_token_expiry)
    }

    pub fn expiry_secs(&self) -> i64 {
        self.expiry_secs
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.expiry_secs)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate signature and expiry
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }
}

/// Response after successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    keys: TokenKeys,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            keys: TokenKeys::from_config(config),
        }
    }

    /// Authenticate user with username and password
    pub async fn login(&self, input: &LoginRequest) -> AppResult<LoginResponse> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, username, real_name, phone, role, created_at, updated_at, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(input.username.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::warn!(username = %row.user.username, "Failed login attempt");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.keys.issue(&row.user)?;
        tracing::info!(user_id = row.user.id, role = row.user.role.as_str(), "User logged in");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.keys.expiry_secs(),
            user: row.user,
        })
    }

    /// Create the default administrator unless an account with that name exists
    pub async fn seed_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        let password_hash = hash_password(password)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, real_name, role)
            VALUES ($1, $2, '系统管理员', 'admin')
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }
}
