//! Form submissions collected from the website.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::email::normalize_email;

/// Which form a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Contact,
    Newsletter,
    Waitlist,
    Preorder,
    Feedback,
    Interest,
    ReviewRequest,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Contact => "contact",
            SubmissionKind::Newsletter => "newsletter",
            SubmissionKind::Waitlist => "waitlist",
            SubmissionKind::Preorder => "preorder",
            SubmissionKind::Feedback => "feedback",
            SubmissionKind::Interest => "interest",
            SubmissionKind::ReviewRequest => "review_request",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(SubmissionKind::Contact),
            "newsletter" => Ok(SubmissionKind::Newsletter),
            "waitlist" => Ok(SubmissionKind::Waitlist),
            "preorder" => Ok(SubmissionKind::Preorder),
            "feedback" => Ok(SubmissionKind::Feedback),
            "interest" => Ok(SubmissionKind::Interest),
            "review_request" => Ok(SubmissionKind::ReviewRequest),
            other => Err(format!("unknown submission kind '{}'", other)),
        }
    }
}

/// One stored form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    /// Normalized; empty for anonymous interest/feedback.
    pub email: String,
    pub name: Option<String>,
    /// Remaining form fields.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl FormSubmission {
    pub fn new(kind: SubmissionKind, email: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            email: normalize_email(email),
            name: None,
            payload,
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    /// Product slug the submission refers to, if any.
    pub fn product(&self) -> Option<&str> {
        self.payload.get("product").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_and_blank_names() {
        let submission = FormSubmission::new(
            SubmissionKind::Newsletter,
            " Sari@Example.com ",
            serde_json::json!({}),
        )
        .with_name(Some("   ".into()));
        assert_eq!(submission.email, "sari@example.com");
        assert!(submission.name.is_none());
    }

    #[test]
    fn kind_parses_its_own_name() {
        for kind in [
            SubmissionKind::Contact,
            SubmissionKind::ReviewRequest,
            SubmissionKind::Waitlist,
        ] {
            assert_eq!(kind.as_str().parse::<SubmissionKind>(), Ok(kind));
        }
    }
}
