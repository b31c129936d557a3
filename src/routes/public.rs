use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    services::submissions::Submission,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/hello/:name", get(hello))
        .route("/form", get(contact_form).post(contact_submit))
        .route("/login", get(login_form).post(login_submit))
        .route("/register", get(register_form).post(register_submit))
        .route("/logout", post(logout))
        .route("/api/session", get(session_status))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    logged_in: bool,
}

async fn landing(current: CurrentUser) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LandingTemplate {
        logged_in: current.0.is_some(),
    })
}

#[derive(Template)]
#[template(path = "hello.html")]
struct HelloTemplate {
    name: String,
}

async fn hello(Path(name): Path<String>) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(HelloTemplate { name })
}

#[derive(Template)]
#[template(path = "contact_form.html")]
struct ContactFormTemplate {
    name: String,
    email: String,
    age: String,
    message: String,
    name_error: String,
    email_error: String,
    age_error: String,
    message_error: String,
}

impl ContactFormTemplate {
    fn empty() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            age: String::new(),
            message: String::new(),
            name_error: String::new(),
            email_error: String::new(),
            age_error: String::new(),
            message_error: String::new(),
        }
    }

    fn has_errors(&self) -> bool {
        !(self.name_error.is_empty()
            && self.email_error.is_empty()
            && self.age_error.is_empty()
            && self.message_error.is_empty())
    }
}

async fn contact_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(ContactFormTemplate::empty())
}

#[derive(Deserialize)]
struct ContactForm {
    name: String,
    email: String,
    age: String,
    message: String,
}

#[derive(Template)]
#[template(path = "contact_result.html")]
struct ContactResultTemplate {
    name: String,
    email: String,
    age: String,
    message: String,
    filename: String,
}

async fn contact_submit(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let mut template = ContactFormTemplate::empty();
    template.name = form.name.trim().to_string();
    template.email = form.email.trim().to_string();
    template.age = form.age.trim().to_string();
    template.message = form.message.clone();

    if template.name.is_empty() {
        template.name_error = "Вкажіть ім'я.".into();
    }
    if template.email.is_empty() {
        template.email_error = "Вкажіть електронну адресу.".into();
    } else if !looks_like_email(&template.email) {
        template.email_error = "Невірний формат електронної адреси.".into();
    }
    if template.age.is_empty() {
        template.age_error = "Вкажіть вік.".into();
    } else if !template.age.chars().all(|c| c.is_ascii_digit()) {
        template.age_error = "Вік може містити лише цифри.".into();
    }
    if template.message.trim().is_empty() {
        template.message_error = "Введіть повідомлення.".into();
    }

    if template.has_errors() {
        return Ok((
            StatusCode::BAD_REQUEST,
            AskamaTemplateResponse::into_response(template),
        )
            .into_response());
    }

    let submission = Submission {
        name: template.name.clone(),
        email: template.email.clone(),
        age: template.age.clone(),
        message: template.message.trim().to_string(),
    };
    let filename = state.submissions.save(&submission).await?;

    Ok(AskamaTemplateResponse::into_response(
        ContactResultTemplate {
            name: submission.name,
            email: submission.email,
            age: submission.age,
            message: submission.message,
            filename,
        },
    ))
}

fn looks_like_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    show_error: bool,
    error_message: String,
    login: String,
}

async fn login_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LoginTemplate {
        show_error: false,
        error_message: String::new(),
        login: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    login: String,
    password: String,
}

async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match auth::authenticate_user(&state, &form.login, &form.password).await {
        Ok(user) => {
            let token = auth::create_session(&state, &user);
            let jar = auth::apply_session_cookie(jar, &token, state.config.session_ttl_secs);
            Ok((jar, Redirect::to("/manage")).into_response())
        }
        // Same message whether the login exists or the password is wrong.
        Err(AppError::Unauthorized) => Ok(render_login_error(
            form.login,
            "Невірний логін або пароль.".into(),
        )),
        Err(AppError::BadRequest(msg)) => Ok(render_login_error(form.login, msg)),
        Err(err) => Err(err),
    }
}

fn render_login_error(login: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(LoginTemplate {
            show_error: true,
            error_message: message,
            login,
        }),
    )
        .into_response()
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    show_error: bool,
    error_message: String,
    login: String,
}

async fn register_form() -> impl IntoResponse {
    AskamaTemplateResponse::into_response(RegisterTemplate {
        show_error: false,
        error_message: String::new(),
        login: String::new(),
    })
}

#[derive(Deserialize)]
struct RegisterForm {
    login: String,
    password: String,
    password_confirm: String,
}

async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(render_register_error(
            form.login,
            "Паролі не збігаються.".into(),
        ));
    }

    match auth::register_user(&state, &form.login, &form.password).await {
        Ok(user) => {
            let token = auth::create_session(&state, &user);
            let jar = auth::apply_session_cookie(jar, &token, state.config.session_ttl_secs);
            Ok((jar, Redirect::to("/manage")).into_response())
        }
        Err(AppError::BadRequest(msg)) => Ok(render_register_error(form.login, msg)),
        Err(err) => Err(err),
    }
}

fn render_register_error(login: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(RegisterTemplate {
            show_error: true,
            error_message: message,
            login,
        }),
    )
        .into_response()
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(cookie) = jar.get(auth::SESSION_COOKIE) {
        auth::destroy_session(&state, cookie.value());
    }
    Ok((auth::clear_session_cookie(jar), Redirect::to("/")))
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    authenticated: bool,
    login_name: Option<String>,
}

/// Unauthenticated is a regular payload here, not an error status.
async fn session_status(current: CurrentUser) -> Json<SessionStatus> {
    match current.0 {
        Some(user) => Json(SessionStatus {
            authenticated: true,
            login_name: Some(user.login_name),
        }),
        None => Json(SessionStatus {
            authenticated: false,
            login_name: None,
        }),
    }
}
