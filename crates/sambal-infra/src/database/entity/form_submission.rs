//! Form submission entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use sambal_core::domain::{FormSubmission, SubmissionKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "form_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub email: String,
    pub name: Option<String>,
    /// Denormalized from the payload for duplicate checks.
    pub product: Option<String>,
    pub payload: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for FormSubmission {
    type Error = String;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind: SubmissionKind = model.kind.parse()?;
        Ok(Self {
            id: model.id,
            kind,
            email: model.email,
            name: model.name,
            payload: model.payload,
            created_at: model.created_at.into(),
        })
    }
}

impl From<FormSubmission> for ActiveModel {
    fn from(submission: FormSubmission) -> Self {
        Self {
            id: Set(submission.id),
            kind: Set(submission.kind.as_str().to_string()),
            email: Set(submission.email.clone()),
            name: Set(submission.name.clone()),
            product: Set(submission.product().map(str::to_string)),
            payload: Set(submission.payload),
            created_at: Set(submission.created_at.into()),
        }
    }
}
