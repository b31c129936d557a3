use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Local;
use tokio::fs;

use crate::error::AppError;

/// A validated contact-form submission ready to be written to disk.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub age: String,
    pub message: String,
}

#[derive(Clone)]
pub struct SubmissionStore {
    root: Arc<PathBuf>,
}

impl SubmissionStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root()).await?;
        Ok(())
    }

    /// Writes one timestamped text file per submission and returns its name.
    pub async fn save(&self, submission: &Submission) -> Result<String, AppError> {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let filename = format!("submission_{timestamp}.txt");
        let path = self.root().join(&filename);

        let divider = "=".repeat(40);
        let body = format!(
            "Дані форми\n{divider}\n\n\
             Ім'я: {}\n\
             Електронна адреса: {}\n\
             Вік: {}\n\
             Повідомлення: {}\n\n\
             {divider}\n\
             Час надсилання: {}\n",
            submission.name,
            submission.email,
            submission.age,
            submission.message,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(path, body).await?;
        Ok(filename)
    }

    pub async fn count(&self) -> Result<usize, AppError> {
        if !fs::try_exists(self.root()).await? {
            return Ok(0);
        }
        let mut entries = fs::read_dir(self.root()).await?;
        let mut total = 0;
        while entries.next_entry().await?.is_some() {
            total += 1;
        }
        Ok(total)
    }
}
