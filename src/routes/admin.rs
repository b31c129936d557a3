use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use sqlx::Row;

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    models::user::UserRole,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users_list))
        .route("/users/:id/role", post(update_user_role))
}

#[derive(Clone)]
struct UserLine {
    id: i64,
    login: String,
    role: String,
    created_at: String,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct AdminUsersTemplate {
    users: Vec<UserLine>,
}

async fn users_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    auth::require_admin(&state, user).await?;

    let rows = sqlx::query("SELECT id, login, role, created_at FROM users ORDER BY created_at")
        .fetch_all(&state.db)
        .await?;
    let users = rows
        .into_iter()
        .map(|row| UserLine {
            id: row.get("id"),
            login: row.get("login"),
            role: row.get("role"),
            created_at: format_datetime(row.get::<String, _>("created_at")),
        })
        .collect();
    Ok(AskamaTemplateResponse::into_response(AdminUsersTemplate {
        users,
    }))
}

#[derive(Deserialize)]
struct RoleForm {
    role: String,
}

async fn update_user_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    let user = current.require_user()?;
    auth::require_admin(&state, user).await?;

    if UserRole::parse(&form.role).is_none() {
        return Err(AppError::BadRequest("Невідома роль.".into()));
    }
    let result = sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2")
        .bind(&form.role)
        .bind(user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to("/admin/users"))
}

// SQLite's datetime('now') writes "YYYY-MM-DD HH:MM:SS" in UTC, no offset.
fn format_datetime(raw: String) -> String {
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| {
            naive
                .and_utc()
                .with_timezone(&Local)
                .format("%d.%m.%Y %H:%M")
                .to_string()
        })
        .unwrap_or(raw)
}
