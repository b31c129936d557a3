use std::{fmt, fs::File, net::SocketAddr};

use anyhow::Context;
use cucumber::{given, then, when, World as _};
use gradebook::{
    auth,
    config::AppConfig,
    db::init_pool,
    services::{
        gradebook as grades, sessions::SessionStore,
        submissions::{Submission, SubmissionStore},
    },
    state::AppState,
};
use tempfile::TempDir;

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    session_tokens: Vec<(String, String)>,
    student_id: Option<i64>,
    course_id: Option<i64>,
    grade_result: Option<Result<i64, String>>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let submissions_dir = root.path().join("submissions");

        let db_path = root.path().join("bdd.sqlite");
        File::create(&db_path)?;
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            submissions_dir: submissions_dir.clone(),
            session_ttl_secs: 3600,
        };

        let db = init_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let submissions = SubmissionStore::new(submissions_dir);
        submissions.ensure_structure().await?;

        let sessions = SessionStore::new(config.session_ttl());

        let app = AppState::new(config, db, sessions, submissions);
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.session_tokens.clear();
    world.student_id = None;
    world.course_id = None;
    world.grade_result = None;
}

#[when(regex = r#"^I register a user \"([^\"]+)\" with password \"([^\"]+)\"$"#)]
async fn when_register_user(world: &mut AppWorld, login: String, password: String) {
    auth::register_user(world.app_state(), &login, &password)
        .await
        .expect("register user");
}

#[then(regex = r#"^I can authenticate as \"([^\"]+)\" using password \"([^\"]+)\"$"#)]
async fn then_can_authenticate(world: &mut AppWorld, login: String, password: String) {
    let user = auth::authenticate_user(world.app_state(), &login, &password)
        .await
        .expect("authentication");
    assert_eq!(user.login, login);
}

#[then(regex = r#"^authentication as \"([^\"]+)\" with password \"([^\"]+)\" fails$"#)]
async fn then_authentication_fails(world: &mut AppWorld, login: String, password: String) {
    assert!(
        auth::authenticate_user(world.app_state(), &login, &password)
            .await
            .is_err()
    );
}

#[then(regex = r#"^the user \"([^\"]+)\" has role \"([^\"]+)\"$"#)]
async fn then_user_has_role(world: &mut AppWorld, login: String, role: String) {
    let stored: String = sqlx::query_scalar("SELECT role FROM users WHERE login = ?1")
        .bind(&login)
        .fetch_one(&world.app_state().db)
        .await
        .expect("role lookup");
    assert_eq!(stored, role);
}

#[when(regex = r#"^I open a session for user id (\d+) named \"([^\"]+)\"$"#)]
async fn when_open_session(world: &mut AppWorld, user_id: i64, login: String) {
    let token = world.app_state().sessions.create(user_id, &login);
    world.session_tokens.push((token, login));
}

#[then(regex = r#"^the latest session resolves to login \"([^\"]+)\"$"#)]
async fn then_session_resolves(world: &mut AppWorld, login: String) {
    let (token, _) = world.session_tokens.last().expect("a session was opened");
    let record = world
        .app_state()
        .sessions
        .lookup(token)
        .expect("session should resolve");
    assert_eq!(record.login_name, login);
}

#[when("I destroy the latest session")]
async fn when_destroy_session(world: &mut AppWorld) {
    let (token, _) = world.session_tokens.last().expect("a session was opened");
    world.app_state().sessions.destroy(token);
}

#[then("the latest session no longer resolves")]
async fn then_session_gone(world: &mut AppWorld) {
    let (token, _) = world.session_tokens.last().expect("a session was opened");
    assert!(world.app_state().sessions.lookup(token).is_none());
}

#[then("the opened session tokens all differ")]
async fn then_tokens_differ(world: &mut AppWorld) {
    for (i, (a, _)) in world.session_tokens.iter().enumerate() {
        for (b, _) in world.session_tokens.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}

#[then("each open session resolves to its own login")]
async fn then_each_session_resolves(world: &mut AppWorld) {
    for (token, login) in &world.session_tokens {
        let record = world
            .app_state()
            .sessions
            .lookup(token)
            .expect("session should resolve");
        assert_eq!(&record.login_name, login);
    }
}

#[given(regex = r#"^a student \"([^\"]+)\" and a course \"([^\"]+)\"$"#)]
async fn given_student_and_course(world: &mut AppWorld, student: String, course: String) {
    let db = world.app_state().db.clone();
    let student_id = grades::create_student(&db, &student, "")
        .await
        .expect("create student");
    let course_id = grades::create_course(&db, &course)
        .await
        .expect("create course");
    world.student_id = Some(student_id);
    world.course_id = Some(course_id);
}

#[when(regex = r#"^I record a grade of \"([^\"]+)\"$"#)]
async fn when_record_grade(world: &mut AppWorld, raw: String) {
    let student_id = world.student_id.expect("student must exist");
    let course_id = world.course_id.expect("course must exist");
    let db = world.app_state().db.clone();
    let result = grades::record_grade(&db, student_id, course_id, &raw)
        .await
        .map_err(|err| err.to_string());
    world.grade_result = Some(result);
}

#[when("I delete the student")]
async fn when_delete_student(world: &mut AppWorld) {
    let student_id = world.student_id.expect("student must exist");
    grades::delete_student(&world.app_state().db, student_id)
        .await
        .expect("delete student");
}

#[then("the grade is rejected")]
async fn then_grade_rejected(world: &mut AppWorld) {
    let result = world.grade_result.as_ref().expect("a grade was recorded");
    assert!(result.is_err(), "expected rejection, got {result:?}");
}

#[then(regex = r"^the student has (\d+) stored grades$")]
async fn then_student_grade_count(world: &mut AppWorld, expected: usize) {
    let all = grades::list_grades(&world.app_state().db)
        .await
        .expect("list grades");
    assert_eq!(all.len(), expected);
}

#[then(regex = r"^the stored grade value is (\d+)$")]
async fn then_stored_grade_value(world: &mut AppWorld, expected: i64) {
    let all = grades::list_grades(&world.app_state().db)
        .await
        .expect("list grades");
    let grade = all.first().expect("one grade expected");
    assert_eq!(grade.value, expected);
}

#[then(regex = r#"^the ECTS report counts (\d+) grade in band \"([^\"]+)\"$"#)]
async fn then_report_band(world: &mut AppWorld, expected: i64, band: String) {
    let distribution = grades::grade_distribution(&world.app_state().db)
        .await
        .expect("distribution");
    let entry = distribution
        .iter()
        .find(|b| b.band == band)
        .expect("band exists");
    assert_eq!(entry.total, expected);
}

#[when(regex = r#"^I save a contact submission from \"([^\"]+)\" with email \"([^\"]+)\"$"#)]
async fn when_save_submission(world: &mut AppWorld, name: String, email: String) {
    let submission = Submission {
        name,
        email,
        age: "21".into(),
        message: "Вітаю!".into(),
    };
    world
        .app_state()
        .submissions
        .save(&submission)
        .await
        .expect("save submission");
}

#[then(regex = r"^there are (\d+) stored submission files$")]
async fn then_submission_files(world: &mut AppWorld, expected: usize) {
    let count = world
        .app_state()
        .submissions
        .count()
        .await
        .expect("count submissions");
    assert_eq!(count, expected);
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
