use crate::{
    config::AppConfig,
    db::DbPool,
    services::{sessions::SessionStore, submissions::SubmissionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub sessions: SessionStore,
    pub submissions: SubmissionStore,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        sessions: SessionStore,
        submissions: SubmissionStore,
    ) -> Self {
        Self {
            config,
            db,
            sessions,
            submissions,
        }
    }
}
