use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{error::AppError, models::user::User, state::AppState};

pub const SESSION_COOKIE: &str = "gradebook_session";

const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a plaintext password into a PHC string (algorithm, cost, salt and
/// digest all embedded), generated with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC string. Malformed
/// stored hashes verify as `false` rather than erroring.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub login_name: String,
}

/// Per-request principal, resolved once from the session cookie before the
/// handler runs. Absence of a session is not a rejection.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|err| -> AppError { match err {} })?;
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };
        let user = state.sessions.lookup(cookie.value()).map(|record| {
            AuthenticatedUser {
                user_id: record.user_id,
                login_name: record.login_name,
            }
        });
        Ok(Self(user))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// Role check for admin-only views; the role lives in the users table, not in
/// the session record.
pub async fn require_admin(state: &AppState, user: &AuthenticatedUser) -> Result<(), AppError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?;
    match role.as_deref() {
        Some("admin") => Ok(()),
        Some(_) => Err(AppError::Forbidden),
        None => Err(AppError::Unauthorized),
    }
}

/// Checks a login/password pair. A missing login and a wrong password are
/// indistinguishable to the caller.
pub async fn authenticate_user(
    state: &AppState,
    login: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, login, password_hash, role, created_at FROM users WHERE login = ?1",
    )
    .bind(login.trim())
    .fetch_optional(&state.db)
    .await?;
    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };
    if !verify_password(password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }
    Ok(user)
}

/// Creates an account, hashing the password at creation time. The first
/// account ever registered becomes the admin.
pub async fn register_user(state: &AppState, login: &str, password: &str) -> Result<User, AppError> {
    let login = login.trim();
    if login.is_empty() {
        return Err(AppError::BadRequest("Вкажіть логін.".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Пароль має містити щонайменше {MIN_PASSWORD_LEN} символів."
        )));
    }

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE login = ?1")
        .bind(login)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("Такий логін вже зайнятий.".into()));
    }

    let password_hash = hash_password(password)?;
    // Role is decided inside the INSERT so two racing registrations cannot
    // both observe an empty table and become admin.
    let result = sqlx::query(
        r#"INSERT INTO users (login, password_hash, role)
           VALUES (?1, ?2,
                   CASE WHEN (SELECT COUNT(*) FROM users) = 0
                        THEN 'admin' ELSE 'teacher' END)"#,
    )
    .bind(login)
    .bind(&password_hash)
    .execute(&state.db)
    .await?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, login, password_hash, role, created_at FROM users WHERE id = ?1",
    )
    .bind(result.last_insert_rowid())
    .fetch_one(&state.db)
    .await?;
    Ok(user)
}

pub fn create_session(state: &AppState, user: &User) -> String {
    state.sessions.create(user.id, &user.login)
}

pub fn destroy_session(state: &AppState, token: &str) {
    state.sessions.destroy(token);
}

/// Sets the session cookie: HTTP-only, same-site, max-age equal to the TTL.
///
/// The max-age is fixed at login and not re-issued on later requests, so the
/// browser discards the cookie TTL seconds after login even while the
/// server-side record keeps sliding; staying signed in past that point takes
/// a fresh login.
pub fn apply_session_cookie(jar: CookieJar, token: &str, ttl_secs: i64) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_secs));
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}
