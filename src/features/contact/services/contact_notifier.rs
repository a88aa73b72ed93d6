use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// A validated contact request ready for hand-off
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub client: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivers contact submissions to whoever follows up on them
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifierError>;
}

/// Records submissions in the application log
pub struct LogContactNotifier;

#[async_trait]
impl ContactNotifier for LogContactNotifier {
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifierError> {
        info!(
            id = %submission.id,
            client = %submission.client,
            name = %submission.name,
            email = %submission.email,
            phone = submission.phone.as_deref().unwrap_or("-"),
            company = submission.company.as_deref().unwrap_or("-"),
            "Contact request received: {}",
            submission.message
        );
        Ok(())
    }
}
