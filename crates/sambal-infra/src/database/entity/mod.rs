//! SeaORM entities.

pub mod form_submission;
