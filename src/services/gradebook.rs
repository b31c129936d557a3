//! Queries and validation for students, courses and grade points.

use sqlx::Row;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        course::Course,
        grade::{BandCount, GradeRow},
        student::Student,
    },
};

/// Band order used for display and zero-filling the distribution report.
pub const ECTS_BANDS: [&str; 6] = ["A", "B", "C", "D", "E", "FX"];

/// Maps a stored 0-100 score to its ECTS letter band (national scale).
pub fn ects_band(value: i64) -> &'static str {
    match value {
        90..=100 => "A",
        82..=89 => "B",
        74..=81 => "C",
        64..=73 => "D",
        60..=63 => "E",
        _ => "FX",
    }
}

/// Parses a raw form value into a storable grade.
///
/// Non-numeric input and values outside 0-100 are rejected; fractional scores
/// are rounded to the nearest integer (95.6 becomes 96).
pub fn parse_grade_value(raw: &str) -> Result<i64, AppError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Оцінка має бути числом.".into()))?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(AppError::BadRequest(
            "Оцінка має бути в діапазоні від 0 до 100.".into(),
        ));
    }
    Ok(value.round() as i64)
}

pub async fn list_students(db: &DbPool) -> Result<Vec<Student>, AppError> {
    let students = sqlx::query_as::<_, Student>(
        "SELECT id, full_name, email FROM student ORDER BY full_name",
    )
    .fetch_all(db)
    .await?;
    Ok(students)
}

pub async fn create_student(db: &DbPool, full_name: &str, email: &str) -> Result<i64, AppError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::BadRequest("Вкажіть ім'я студента.".into()));
    }
    let result = sqlx::query("INSERT INTO student (full_name, email) VALUES (?1, ?2)")
        .bind(full_name)
        .bind(email.trim())
        .execute(db)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn delete_student(db: &DbPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM student WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn list_courses(db: &DbPool) -> Result<Vec<Course>, AppError> {
    let courses = sqlx::query_as::<_, Course>("SELECT id, title FROM course ORDER BY title")
        .fetch_all(db)
        .await?;
    Ok(courses)
}

pub async fn create_course(db: &DbPool, title: &str) -> Result<i64, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Вкажіть назву курсу.".into()));
    }
    let result = sqlx::query("INSERT INTO course (title) VALUES (?1)")
        .bind(title)
        .execute(db)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn delete_course(db: &DbPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM course WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn list_grades(db: &DbPool) -> Result<Vec<GradeRow>, AppError> {
    let grades = sqlx::query_as::<_, GradeRow>(
        r#"SELECT p.id, p.student_id, p.course_id, s.full_name AS student_name,
                  c.title AS course_title, p.value
           FROM points p
           JOIN student s ON s.id = p.student_id
           JOIN course c ON c.id = p.course_id
           ORDER BY s.full_name, c.title"#,
    )
    .fetch_all(db)
    .await?;
    Ok(grades)
}

pub async fn get_grade(db: &DbPool, id: i64) -> Result<GradeRow, AppError> {
    let grade = sqlx::query_as::<_, GradeRow>(
        r#"SELECT p.id, p.student_id, p.course_id, s.full_name AS student_name,
                  c.title AS course_title, p.value
           FROM points p
           JOIN student s ON s.id = p.student_id
           JOIN course c ON c.id = p.course_id
           WHERE p.id = ?1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    grade.ok_or(AppError::NotFound)
}

/// Records a grade after validating the raw value; returns the new row id.
pub async fn record_grade(
    db: &DbPool,
    student_id: i64,
    course_id: i64,
    raw_value: &str,
) -> Result<i64, AppError> {
    let value = parse_grade_value(raw_value)?;
    let result = sqlx::query("INSERT INTO points (student_id, course_id, value) VALUES (?1, ?2, ?3)")
        .bind(student_id)
        .bind(course_id)
        .bind(value)
        .execute(db)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update_grade(db: &DbPool, id: i64, raw_value: &str) -> Result<(), AppError> {
    let value = parse_grade_value(raw_value)?;
    let result = sqlx::query("UPDATE points SET value = ?1 WHERE id = ?2")
        .bind(value)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn delete_grade(db: &DbPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM points WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Grade distribution across the six ECTS bands, zero-filled in band order.
pub async fn grade_distribution(db: &DbPool) -> Result<Vec<BandCount>, AppError> {
    let rows = sqlx::query(
        r#"SELECT CASE
                    WHEN value >= 90 THEN 'A'
                    WHEN value >= 82 THEN 'B'
                    WHEN value >= 74 THEN 'C'
                    WHEN value >= 64 THEN 'D'
                    WHEN value >= 60 THEN 'E'
                    ELSE 'FX'
                  END AS band,
                  COUNT(*) AS total
           FROM points
           GROUP BY band"#,
    )
    .fetch_all(db)
    .await?;

    let mut distribution: Vec<BandCount> = ECTS_BANDS
        .iter()
        .map(|band| BandCount { band, total: 0 })
        .collect();
    for row in rows {
        let band: String = row.get("band");
        let total: i64 = row.get("total");
        if let Some(entry) = distribution.iter_mut().find(|e| e.band == band) {
            entry.total = total;
        }
    }
    Ok(distribution)
}
