use async_trait::async_trait;

use crate::domain::{FormSubmission, SubmissionKind};
use crate::error::RepoError;

/// Store for website form submissions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Persist a submission and return it as stored.
    async fn save(&self, submission: FormSubmission) -> Result<FormSubmission, RepoError>;

    /// Whether `email` already has a submission of `kind`, optionally for one product.
    async fn exists(
        &self,
        kind: SubmissionKind,
        email: &str,
        product: Option<&str>,
    ) -> Result<bool, RepoError>;

    /// Number of stored submissions of `kind`.
    async fn count(&self, kind: SubmissionKind) -> Result<u64, RepoError>;
}
