//! HTTP handlers for user management (admin only)

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{Ack, ListQuery, SearchQuery};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::UserService;
use crate::AppState;
use shared::{CreateUserRequest, PaginatedResponse, UpdateUserRequest, User};

pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    current_user.0.require_admin()?;
    input.validate()?;

    let user = UserService::new(state.db).create(&input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    current_user.0.require_admin()?;
    input.validate()?;

    let user = UserService::new(state.db).update(id, &input).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Ack>> {
    current_user.0.require_admin()?;

    UserService::new(state.db)
        .delete(current_user.0.user_id, id)
        .await?;
    Ok(Json(Ack::ok()))
}

pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    current_user.0.require_admin()?;

    let users = UserService::new(state.db).list(&query.pagination()).await?;
    Ok(Json(users))
}

pub async fn search_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<User>>> {
    current_user.0.require_admin()?;

    let users = UserService::new(state.db)
        .search(query.keyword.as_deref())
        .await?;
    Ok(Json(users))
}
