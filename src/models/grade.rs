use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `points` table joined with student and course names for display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GradeRow {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub student_name: String,
    pub course_title: String,
    pub value: i64,
}

/// One ECTS letter band together with how many grades fall into it.
#[derive(Debug, Clone, Serialize)]
pub struct BandCount {
    pub band: &'static str,
    pub total: i64,
}
