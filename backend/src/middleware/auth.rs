//! Authentication middleware
//!
//! Bearer-token validation and the admin capability check

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, AppResult};
use crate::services::auth::TokenKeys;
use crate::services::UserService;
use crate::AppState;
use shared::Role;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// User management, backup/restore and record edits need the admin role
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user_id = self.user_id, "Admin-only operation refused");
            Err(AppError::InsufficientPermissions)
        }
    }
}

/// Validates the bearer token and makes the caller available to handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(request.headers())?;
    let claims = TokenKeys::from_config(&state.config).verify(token)?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::InvalidToken)?;

    let stored_role = UserService::new(state.db.clone()).role_of(user_id).await?;
    let user = resolve_user(
        AuthUser {
            user_id,
            username: claims.username,
            role: claims.role,
        },
        stored_role,
    )?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// The stored role wins over the one in the token; a deleted account's token is void
fn resolve_user(token_user: AuthUser, stored_role: Option<Role>) -> AppResult<AuthUser> {
    let Some(role) = stored_role else {
        tracing::warn!(user_id = token_user.user_id, "Token for a deleted account");
        return Err(AppError::InvalidToken);
    };
    if role != token_user.role {
        tracing::debug!(user_id = token_user.user_id, ?role, "Role changed since login");
    }
    Ok(AuthUser { role, ..token_user })
}

fn extract_bearer(headers: &HeaderMap) -> AppResult<&str> {
    let missing = || AppError::Unauthorized {
        message: "Missing or invalid Authorization header".to_string(),
        message_zh: "未登录或登录凭证缺失".to_string(),
    };

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(missing)?;

    if token.is_empty() {
        return Err(missing());
    }
    Ok(token)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Authentication required".to_string(),
                message_zh: "请先登录".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer(&headers),
            Err(AppError::Unauthorized { .. })
        ));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(extract_bearer(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer(&headers).is_err());
    }

    #[test]
    fn staff_cannot_pass_admin_check() {
        let staff = AuthUser {
            user_id: 2,
            username: "clerk".into(),
            role: Role::Staff,
        };
        assert!(matches!(
            staff.require_admin(),
            Err(AppError::InsufficientPermissions)
        ));
        let admin = AuthUser {
            role: Role::Admin,
            ..staff
        };
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn demoted_admin_loses_admin_rights() {
        let token_user = AuthUser {
            user_id: 3,
            username: "manager".into(),
            role: Role::Admin,
        };
        let user = resolve_user(token_user, Some(Role::Staff)).unwrap();
        assert_eq!(user.role, Role::Staff);
        assert!(matches!(
            user.require_admin(),
            Err(AppError::InsufficientPermissions)
        ));
    }

    #[test]
    fn deleted_account_token_is_rejected() {
        let token_user = AuthUser {
            user_id: 4,
            username: "gone".into(),
            role: Role::Admin,
        };
        assert!(matches!(
            resolve_user(token_user, None),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn current_user_reads_request_extensions() {
        use axum::extract::FromRequestParts;
        use axum::http::Request;

        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let missing = tokio_test::block_on(CurrentUser::from_request_parts(&mut parts, &()));
        assert!(matches!(missing, Err(AppError::Unauthorized { .. })));

        parts.extensions.insert(AuthUser {
            user_id: 9,
            username: "admin".into(),
            role: Role::Admin,
        });
        let current = tokio_test::block_on(CurrentUser::from_request_parts(&mut parts, &()))
            .unwrap();
        assert_eq!(current.0.user_id, 9);
        assert!(current.0.is_admin());
    }
}
