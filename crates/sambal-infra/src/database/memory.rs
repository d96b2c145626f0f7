//! In-process submission store, used when no database is configured.

use async_trait::async_trait;
use parking_lot::RwLock;

use sambal_core::domain::{FormSubmission, SubmissionKind};
use sambal_core::error::RepoError;
use sambal_core::ports::SubmissionRepository;

#[derive(Debug, Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<Vec<FormSubmission>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn save(&self, submission: FormSubmission) -> Result<FormSubmission, RepoError> {
        self.submissions.write().push(submission.clone());
        Ok(submission)
    }

    async fn exists(
        &self,
        kind: SubmissionKind,
        email: &str,
        product: Option<&str>,
    ) -> Result<bool, RepoError> {
        Ok(self.submissions.read().iter().any(|s| {
            s.kind == kind && s.email == email && product.is_none_or(|p| s.product() == Some(p))
        }))
    }

    async fn count(&self, kind: SubmissionKind) -> Result<u64, RepoError> {
        Ok(self.submissions.read().iter().filter(|s| s.kind == kind).count() as u64)
    }
}
