//! Domain entities - the core business objects.

pub mod campaign;
pub mod email;
pub mod product;
pub mod rate_limit;
mod submission;

pub use campaign::{
    CampaignKind, CampaignMode, CartItem, PlannedStep, Recipient, StepContext, StepDefinition,
};
pub use product::{Price, PriceSource, Product};
pub use rate_limit::{Decision, EndpointClass, EndpointPolicy, Quota, RateLimitEntry};
pub use submission::{FormSubmission, SubmissionKind};
