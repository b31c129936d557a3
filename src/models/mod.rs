pub mod course;
pub mod grade;
pub mod session;
pub mod student;
pub mod user;
