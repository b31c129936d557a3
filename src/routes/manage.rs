use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{course::Course, student::Student},
    services::gradebook,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/students", get(students_list).post(student_create))
        .route("/students/:id/delete", post(student_delete))
        .route("/courses", get(courses_list).post(course_create))
        .route("/courses/:id/delete", post(course_delete))
        .route("/grades", get(grades_list).post(grade_create))
        .route("/grades/:id", get(grade_edit_form).post(grade_update))
        .route("/grades/:id/delete", post(grade_delete))
        .route("/report", get(report))
}

#[derive(Template)]
#[template(path = "manage/dashboard.html")]
struct DashboardTemplate {
    display_name: String,
    student_count: i64,
    course_count: i64,
    grade_count: i64,
}

async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    let student_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM student")
        .fetch_one(&state.db)
        .await?;
    let course_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course")
        .fetch_one(&state.db)
        .await?;
    let grade_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM points")
        .fetch_one(&state.db)
        .await?;
    Ok(AskamaTemplateResponse::into_response(DashboardTemplate {
        display_name: user.login_name.clone(),
        student_count,
        course_count,
        grade_count,
    }))
}

#[derive(Template)]
#[template(path = "manage/students.html")]
struct StudentsTemplate {
    students: Vec<Student>,
    show_error: bool,
    error_message: String,
    full_name: String,
    email: String,
}

async fn students_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    let students = gradebook::list_students(&state.db).await?;
    Ok(AskamaTemplateResponse::into_response(StudentsTemplate {
        students,
        show_error: false,
        error_message: String::new(),
        full_name: String::new(),
        email: String::new(),
    }))
}

#[derive(Deserialize)]
struct StudentForm {
    full_name: String,
    email: String,
}

async fn student_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<StudentForm>,
) -> Result<Response, AppError> {
    current.require_user()?;
    match gradebook::create_student(&state.db, &form.full_name, &form.email).await {
        Ok(_) => Ok(Redirect::to("/manage/students").into_response()),
        Err(AppError::BadRequest(msg)) => {
            let students = gradebook::list_students(&state.db).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                AskamaTemplateResponse::into_response(StudentsTemplate {
                    students,
                    show_error: true,
                    error_message: msg,
                    full_name: form.full_name,
                    email: form.email,
                }),
            )
                .into_response())
        }
        Err(err) => Err(err),
    }
}

async fn student_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    current.require_user()?;
    gradebook::delete_student(&state.db, id).await?;
    Ok(Redirect::to("/manage/students"))
}

#[derive(Template)]
#[template(path = "manage/courses.html")]
struct CoursesTemplate {
    courses: Vec<Course>,
    show_error: bool,
    error_message: String,
    title: String,
}

async fn courses_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    let courses = gradebook::list_courses(&state.db).await?;
    Ok(AskamaTemplateResponse::into_response(CoursesTemplate {
        courses,
        show_error: false,
        error_message: String::new(),
        title: String::new(),
    }))
}

#[derive(Deserialize)]
struct CourseForm {
    title: String,
}

async fn course_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<CourseForm>,
) -> Result<Response, AppError> {
    current.require_user()?;
    match gradebook::create_course(&state.db, &form.title).await {
        Ok(_) => Ok(Redirect::to("/manage/courses").into_response()),
        Err(AppError::BadRequest(msg)) => {
            let courses = gradebook::list_courses(&state.db).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                AskamaTemplateResponse::into_response(CoursesTemplate {
                    courses,
                    show_error: true,
                    error_message: msg,
                    title: form.title,
                }),
            )
                .into_response())
        }
        Err(err) => Err(err),
    }
}

async fn course_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    current.require_user()?;
    gradebook::delete_course(&state.db, id).await?;
    Ok(Redirect::to("/manage/courses"))
}

#[derive(Clone)]
struct GradeLine {
    id: i64,
    student_name: String,
    course_title: String,
    value: i64,
    band: &'static str,
}

#[derive(Template)]
#[template(path = "manage/grades.html")]
struct GradesTemplate {
    grades: Vec<GradeLine>,
    students: Vec<Student>,
    courses: Vec<Course>,
    show_error: bool,
    error_message: String,
    value: String,
}

async fn grades_page(
    state: &AppState,
    show_error: bool,
    error_message: String,
    value: String,
) -> Result<GradesTemplate, AppError> {
    let grades = gradebook::list_grades(&state.db)
        .await?
        .into_iter()
        .map(|g| GradeLine {
            id: g.id,
            student_name: g.student_name,
            course_title: g.course_title,
            value: g.value,
            band: gradebook::ects_band(g.value),
        })
        .collect();
    Ok(GradesTemplate {
        grades,
        students: gradebook::list_students(&state.db).await?,
        courses: gradebook::list_courses(&state.db).await?,
        show_error,
        error_message,
        value,
    })
}

async fn grades_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    let template = grades_page(&state, false, String::new(), String::new()).await?;
    Ok(AskamaTemplateResponse::into_response(template))
}

#[derive(Deserialize)]
struct GradeForm {
    student_id: i64,
    course_id: i64,
    value: String,
}

async fn grade_create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<GradeForm>,
) -> Result<Response, AppError> {
    current.require_user()?;
    match gradebook::record_grade(&state.db, form.student_id, form.course_id, &form.value).await {
        Ok(_) => Ok(Redirect::to("/manage/grades").into_response()),
        Err(AppError::BadRequest(msg)) => {
            let template = grades_page(&state, true, msg, form.value).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                AskamaTemplateResponse::into_response(template),
            )
                .into_response())
        }
        Err(err) => Err(err),
    }
}

#[derive(Template)]
#[template(path = "manage/grade_edit.html")]
struct GradeEditTemplate {
    id: i64,
    student_name: String,
    course_title: String,
    value: String,
    show_error: bool,
    error_message: String,
}

async fn grade_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    let grade = gradebook::get_grade(&state.db, id).await?;
    Ok(AskamaTemplateResponse::into_response(GradeEditTemplate {
        id: grade.id,
        student_name: grade.student_name,
        course_title: grade.course_title,
        value: grade.value.to_string(),
        show_error: false,
        error_message: String::new(),
    }))
}

#[derive(Deserialize)]
struct GradeUpdateForm {
    value: String,
}

async fn grade_update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<GradeUpdateForm>,
) -> Result<Response, AppError> {
    current.require_user()?;
    match gradebook::update_grade(&state.db, id, &form.value).await {
        Ok(()) => Ok(Redirect::to("/manage/grades").into_response()),
        Err(AppError::BadRequest(msg)) => {
            let grade = gradebook::get_grade(&state.db, id).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                AskamaTemplateResponse::into_response(GradeEditTemplate {
                    id: grade.id,
                    student_name: grade.student_name,
                    course_title: grade.course_title,
                    value: form.value,
                    show_error: true,
                    error_message: msg,
                }),
            )
                .into_response())
        }
        Err(err) => Err(err),
    }
}

async fn grade_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    current.require_user()?;
    gradebook::delete_grade(&state.db, id).await?;
    Ok(Redirect::to("/manage/grades"))
}

#[derive(Clone)]
struct BandLine {
    band: &'static str,
    total: i64,
}

#[derive(Template)]
#[template(path = "manage/report.html")]
struct ReportTemplate {
    bands: Vec<BandLine>,
    total: i64,
}

async fn report(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    current.require_user()?;
    let distribution = gradebook::grade_distribution(&state.db).await?;
    let total = distribution.iter().map(|b| b.total).sum();
    let bands = distribution
        .into_iter()
        .map(|b| BandLine {
            band: b.band,
            total: b.total,
        })
        .collect();
    Ok(AskamaTemplateResponse::into_response(ReportTemplate {
        bands,
        total,
    }))
}
