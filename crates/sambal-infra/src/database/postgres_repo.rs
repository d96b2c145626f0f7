//! PostgreSQL submission store.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter, SqlErr,
};

use sambal_core::domain::{FormSubmission, SubmissionKind};
use sambal_core::error::RepoError;
use sambal_core::ports::SubmissionRepository;

use super::entity::form_submission::{self, ActiveModel, Entity as SubmissionEntity};

pub struct PostgresSubmissionRepository {
    db: DbConn,
}

impl PostgresSubmissionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn map_db_err(e: DbErr) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
        return RepoError::Constraint(detail);
    }
    match e {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => RepoError::Connection(e.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn save(&self, submission: FormSubmission) -> Result<FormSubmission, RepoError> {
        let kind = submission.kind;
        let active: ActiveModel = submission.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;

        tracing::debug!(id = %model.id, kind = %kind, "Submission stored");

        FormSubmission::try_from(model).map_err(RepoError::Query)
    }

    async fn exists(
        &self,
        kind: SubmissionKind,
        email: &str,
        product: Option<&str>,
    ) -> Result<bool, RepoError> {
        let mut query = SubmissionEntity::find()
            .filter(form_submission::Column::Kind.eq(kind.as_str()))
            .filter(form_submission::Column::Email.eq(email));
        if let Some(product) = product {
            query = query.filter(form_submission::Column::Product.eq(product));
        }

        let found = query.one(&self.db).await.map_err(map_db_err)?;
        Ok(found.is_some())
    }

    async fn count(&self, kind: SubmissionKind) -> Result<u64, RepoError> {
        SubmissionEntity::find()
            .filter(form_submission::Column::Kind.eq(kind.as_str()))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}
