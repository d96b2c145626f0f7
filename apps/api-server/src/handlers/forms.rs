//! Website form endpoints: validate, store, acknowledge.

use actix_web::{HttpResponse, web};
use serde_json::json;

use sambal_core::domain::email::{is_valid_email, normalize_email};
use sambal_core::domain::product::find_product;
use sambal_core::domain::campaign::first_name;
use sambal_core::domain::{
    CampaignKind, CampaignMode, FormSubmission, Price, Product, Recipient, SubmissionKind,
};
use sambal_infra::price_for;
use sambal_shared::dto::{
    ContactRequest, FeedbackRequest, InterestRequest, NewsletterRequest, PreorderRequest,
    SubmissionAccepted, WaitlistRequest,
};
use sambal_shared::{ApiResponse, FieldErrors};

use super::{accepted_or_simulated, send_detached};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const EMAIL_REQUIRED: &str = "A valid email address is required";
const MAX_PREORDER_QUANTITY: u32 = 24;

fn validated(errors: FieldErrors) -> AppResult<()> {
    errors.finish().map_err(AppError::Validation)
}

fn product(slug: &str) -> AppResult<&'static Product> {
    find_product(slug.trim()).ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Blank optional strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn accepted(message: impl Into<String>, body: SubmissionAccepted) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(message, body))
}

/// Whether a submission already exists. An unreachable store counts as "no".
async fn already_submitted(
    state: &AppState,
    kind: SubmissionKind,
    email: &str,
    product: Option<&str>,
) -> AppResult<bool> {
    match state.submissions.exists(kind, email, product).await {
        Ok(found) => Ok(found),
        Err(e) if e.is_unavailable() => {
            tracing::warn!(error = %e, kind = %kind, "Duplicate check skipped");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/contact
pub async fn contact(
    state: web::Data<AppState>,
    body: web::Json<ContactRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let mut errors = FieldErrors::new();
    errors
        .require(&body.name, "Name")
        .max_chars(&body.name, 100, "Name")
        .check(is_valid_email(&body.email), EMAIL_REQUIRED)
        .min_chars(&body.message, 10, "Message")
        .max_chars(&body.message, 5000, "Message");
    validated(errors)?;

    let subject = present(body.subject).unwrap_or_else(|| "Website enquiry".to_string());
    let submission = FormSubmission::new(
        SubmissionKind::Contact,
        &body.email,
        json!({ "subject": subject, "message": body.message.trim() }),
    )
    .with_name(Some(body.name));

    let stored = state.submissions.save(submission).await?;

    let recipient = Recipient::new(stored.email.clone())
        .with_name(stored.name.clone().unwrap_or_default());
    send_detached(
        state.mailer.clone(),
        "contact-acknowledgement",
        stored.email.clone(),
        json!({ "firstName": first_name(&recipient), "subject": subject }),
    );
    if let Some(inbox) = &state.notify_address {
        send_detached(
            state.mailer.clone(),
            "contact-notification",
            inbox.clone(),
            json!({
                "name": stored.name,
                "email": stored.email,
                "subject": subject,
                "message": stored.payload["message"],
            }),
        );
    }

    Ok(accepted(
        "Thanks for getting in touch! We'll get back to you soon.",
        SubmissionAccepted {
            id: Some(stored.id.to_string()),
            simulated: false,
        },
    ))
}

/// POST /api/newsletter
pub async fn newsletter(
    state: web::Data<AppState>,
    body: web::Json<NewsletterRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let mut errors = FieldErrors::new();
    errors.check(is_valid_email(&body.email), EMAIL_REQUIRED);
    validated(errors)?;

    let email = normalize_email(&body.email);
    if already_submitted(&state, SubmissionKind::Newsletter, &email, None).await? {
        return Err(AppError::Conflict(
            "This email is already subscribed to our newsletter.".to_string(),
        ));
    }

    let name = present(body.name);
    let submission = FormSubmission::new(
        SubmissionKind::Newsletter,
        &email,
        json!({ "source": present(body.source).unwrap_or_else(|| "website".to_string()) }),
    )
    .with_name(name.clone());
    let outcome = accepted_or_simulated(state.submissions.save(submission).await)?;

    let mut recipient = Recipient::new(email);
    recipient.name = name;
    state
        .campaigns
        .schedule(CampaignKind::WelcomeSeries, recipient, CampaignMode::Production)
        .await?;

    Ok(accepted(
        "Welcome to the sambal family! Check your inbox for a welcome email.",
        outcome,
    ))
}

/// POST /api/waitlist
pub async fn waitlist(
    state: web::Data<AppState>,
    body: web::Json<WaitlistRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let mut errors = FieldErrors::new();
    errors
        .check(is_valid_email(&body.email), EMAIL_REQUIRED)
        .require(&body.product, "Product");
    validated(errors)?;

    let product = product(&body.product)?;
    let email = normalize_email(&body.email);
    if already_submitted(&state, SubmissionKind::Waitlist, &email, Some(product.slug)).await? {
        return Err(AppError::Conflict(format!(
            "You're already on the waitlist for {}.",
            product.name
        )));
    }

    let submission = FormSubmission::new(
        SubmissionKind::Waitlist,
        &email,
        json!({ "product": product.slug }),
    )
    .with_name(present(body.name));
    let stored = state.submissions.save(submission).await?;

    let recipient = Recipient::new(stored.email.clone())
        .with_name(stored.name.clone().unwrap_or_default());
    send_detached(
        state.mailer.clone(),
        "waitlist-confirmation",
        stored.email.clone(),
        json!({ "firstName": first_name(&recipient), "productName": product.name }),
    );

    Ok(accepted(
        format!("You're on the waitlist for {}. We'll email you when it's ready.", product.name),
        SubmissionAccepted {
            id: Some(stored.id.to_string()),
            simulated: false,
        },
    ))
}

/// POST /api/interest
pub async fn interest(
    state: web::Data<AppState>,
    body: web::Json<InterestRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let email = present(body.email);

    let mut errors = FieldErrors::new();
    errors.require(&body.product, "Product");
    if let Some(email) = &email {
        errors.check(is_valid_email(email), EMAIL_REQUIRED);
    }
    validated(errors)?;

    let product = product(&body.product)?;
    let submission = FormSubmission::new(
        SubmissionKind::Interest,
        email.as_deref().unwrap_or_default(),
        json!({
            "product": product.slug,
            "source": present(body.source).unwrap_or_else(|| "website".to_string()),
        }),
    );
    let stored = state.submissions.save(submission).await?;

    Ok(accepted(
        format!("Thanks for your interest in {}!", product.name),
        SubmissionAccepted {
            id: Some(stored.id.to_string()),
            simulated: false,
        },
    ))
}

/// POST /api/preorder
pub async fn preorder(
    state: web::Data<AppState>,
    body: web::Json<PreorderRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();

    let mut errors = FieldErrors::new();
    errors
        .require(&body.name, "Name")
        .check(is_valid_email(&body.email), EMAIL_REQUIRED)
        .require(&body.product, "Product")
        .in_range(body.quantity, 1, MAX_PREORDER_QUANTITY, "Quantity");
    validated(errors)?;

    let product = product(&body.product)?;
    let price = price_for(state.prices.as_ref(), product).await;
    let total = price.unit_amount.saturating_mul(body.quantity);

    let submission = FormSubmission::new(
        SubmissionKind::Preorder,
        &body.email,
        json!({
            "product": product.slug,
            "quantity": body.quantity,
            "unitAmount": price.unit_amount,
            "currency": price.currency,
        }),
    )
    .with_name(Some(body.name.clone()));
    let email = submission.email.clone();
    let outcome = accepted_or_simulated(state.submissions.save(submission).await)?;

    let recipient = Recipient::new(email.clone()).with_name(body.name);
    send_detached(
        state.mailer.clone(),
        "preorder-confirmation",
        email,
        json!({
            "firstName": first_name(&recipient),
            "productName": product.name,
            "quantity": body.quantity,
            "unitPrice": price.display(),
            "total": Price { unit_amount: total, ..price.clone() }.display(),
        }),
    );

    Ok(accepted(
        format!(
            "Pre-order received for {} x {}. We'll be in touch before it ships.",
            body.quantity, product.name
        ),
        outcome,
    ))
}

/// POST /api/feedback
pub async fn feedback(
    state: web::Data<AppState>,
    body: web::Json<FeedbackRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let email = present(body.email);

    let mut errors = FieldErrors::new();
    errors
        .in_range(body.rating, 1, 5, "Rating")
        .require(&body.comment, "Comment")
        .max_chars(&body.comment, 2000, "Comment");
    if let Some(email) = &email {
        errors.check(is_valid_email(email), EMAIL_REQUIRED);
    }
    validated(errors)?;

    let submission = FormSubmission::new(
        SubmissionKind::Feedback,
        email.as_deref().unwrap_or_default(),
        json!({
            "rating": body.rating,
            "comment": body.comment.trim(),
            "orderNumber": present(body.order_number),
        }),
    );
    let stored = state.submissions.save(submission).await?;

    Ok(accepted(
        "Thank you for your feedback!",
        SubmissionAccepted {
            id: Some(stored.id.to_string()),
            simulated: false,
        },
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use sambal_core::error::RepoError;
    use sambal_core::ports::SubmissionRepository;
    use serde_json::{Value, json};

    use super::*;
    use crate::handlers::configure_app;
    use crate::handlers::testing::{RecordingMailer, settle};

    /// Store that cannot be reached.
    struct DownStore;

    #[async_trait]
    impl SubmissionRepository for DownStore {
        async fn save(&self, _s: FormSubmission) -> Result<FormSubmission, RepoError> {
            Err(RepoError::Connection("connection refused".into()))
        }
        async fn exists(
            &self,
            _k: SubmissionKind,
            _e: &str,
            _p: Option<&str>,
        ) -> Result<bool, RepoError> {
            Err(RepoError::Connection("connection refused".into()))
        }
        async fn count(&self, _k: SubmissionKind) -> Result<u64, RepoError> {
            Err(RepoError::Connection("connection refused".into()))
        }
    }

    /// Store that rejects writes.
    struct BrokenStore;

    #[async_trait]
    impl SubmissionRepository for BrokenStore {
        async fn save(&self, _s: FormSubmission) -> Result<FormSubmission, RepoError> {
            Err(RepoError::Query("relation does not exist".into()))
        }
        async fn exists(
            &self,
            _k: SubmissionKind,
            _e: &str,
            _p: Option<&str>,
        ) -> Result<bool, RepoError> {
            Ok(false)
        }
        async fn count(&self, _k: SubmissionKind) -> Result<u64, RepoError> {
            Ok(0)
        }
    }

    async fn post(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        let app = test::init_service(App::new().configure(|cfg| configure_app(cfg, state.clone())))
            .await;
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(("X-Forwarded-For", "10.1.1.1"))
            .set_json(body)
            .to_request();
        let res = test::call_service(&app, req).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn contact_stores_and_acknowledges() {
        let mailer = RecordingMailer::shared();
        let mut state = AppState::in_memory(mailer.clone());
        state.notify_address = Some("team@sambal.test".into());

        let (status, body) = post(
            &state,
            "/api/contact",
            json!({"name": "Sari Wulandari", "email": "Sari@Example.com", "message": "Do you ship to Scotland?"}),
        )
        .await;
        settle().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["id"].is_string());
        assert_eq!(state.submissions.count(SubmissionKind::Contact).await.unwrap(), 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "contact-acknowledgement");
        assert_eq!(sent[0].1, "sari@example.com");
        assert_eq!(sent[0].2["firstName"], "Sari");
        assert_eq!(sent[1].0, "contact-notification");
        assert_eq!(sent[1].1, "team@sambal.test");
    }

    #[actix_web::test]
    async fn contact_rejects_short_message() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let (status, body) = post(
            &state,
            "/api/contact",
            json!({"name": "Sari", "email": "sari@example.com", "message": "hi"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Message must be at least 10 characters");
    }

    #[actix_web::test]
    async fn contact_store_failure_is_a_generic_500() {
        let mut state = AppState::in_memory(RecordingMailer::shared());
        state.submissions = Arc::new(BrokenStore);

        let (status, body) = post(
            &state,
            "/api/contact",
            json!({"name": "Sari", "email": "sari@example.com", "message": "Do you ship to Scotland?"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Something went wrong. Please try again later.");
    }

    #[actix_web::test]
    async fn malformed_json_gets_the_400_envelope() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let app = test::init_service(App::new().configure(|cfg| configure_app(cfg, state.clone())))
            .await;
        let req = test::TestRequest::post()
            .uri("/api/contact")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn newsletter_twice_is_a_conflict() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let body = json!({"email": "ayu@example.com", "name": "Ayu"});

        let (first, _) = post(&state, "/api/newsletter", body.clone()).await;
        let (second, response) = post(&state, "/api/newsletter", body).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(response["success"], false);
    }

    #[actix_web::test]
    async fn newsletter_starts_the_welcome_series() {
        tokio::time::pause();
        let mailer = RecordingMailer::shared();
        let state = AppState::in_memory(mailer.clone());

        let (status, _) = post(&state, "/api/newsletter", json!({"email": "ayu@example.com"})).await;
        assert_eq!(status, StatusCode::OK);

        tokio::time::sleep(std::time::Duration::from_secs(11 * 24 * 3600)).await;
        assert_eq!(
            mailer.templates(),
            vec![
                "welcome-hello",
                "welcome-our-story",
                "welcome-heat-guide",
                "welcome-recipes",
                "welcome-first-order"
            ]
        );
    }

    #[actix_web::test]
    async fn newsletter_with_unreachable_store_still_succeeds() {
        let mut state = AppState::in_memory(RecordingMailer::shared());
        state.submissions = Arc::new(DownStore);

        let (status, body) =
            post(&state, "/api/newsletter", json!({"email": "ayu@example.com"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["simulated"], true);
    }

    #[actix_web::test]
    async fn waitlist_checks_product_and_duplicates() {
        let mailer = RecordingMailer::shared();
        let state = AppState::in_memory(mailer.clone());

        let (status, _) = post(
            &state,
            "/api/waitlist",
            json!({"email": "budi@example.com", "product": "sambal-nanas"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let body = json!({"email": "budi@example.com", "product": "sambal-terasi"});
        let (status, response) = post(&state, "/api/waitlist", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response["message"].as_str().unwrap().contains("Sambal Terasi"));

        let (status, _) = post(&state, "/api/waitlist", body).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = post(
            &state,
            "/api/waitlist",
            json!({"email": "budi@example.com", "product": "sambal-ijo"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        settle().await;
        assert_eq!(mailer.templates(), vec!["waitlist-confirmation", "waitlist-confirmation"]);
    }

    #[actix_web::test]
    async fn interest_allows_anonymous_visitors() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let (status, _) = post(&state, "/api/interest", json!({"product": "sambal-matah"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post(
            &state,
            "/api/interest",
            json!({"product": "sambal-matah", "email": "nope"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn preorder_quantity_is_bounded() {
        let state = AppState::in_memory(RecordingMailer::shared());
        for quantity in [0, 25] {
            let (status, body) = post(
                &state,
                "/api/preorder",
                json!({"name": "Budi", "email": "budi@example.com", "product": "sambal-ijo", "quantity": quantity}),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Quantity must be between 1 and 24");
        }
    }

    #[actix_web::test]
    async fn preorder_confirmation_uses_catalog_price_without_live_prices() {
        let mailer = RecordingMailer::shared();
        let state = AppState::in_memory(mailer.clone());

        let (status, _) = post(
            &state,
            "/api/preorder",
            json!({"name": "Budi Santoso", "email": "budi@example.com", "product": "sambal-bawang", "quantity": 2}),
        )
        .await;
        settle().await;

        assert_eq!(status, StatusCode::OK);
        let sent = mailer.sent();
        assert_eq!(sent[0].0, "preorder-confirmation");
        assert_eq!(sent[0].2["unitPrice"], "£5.99");
        assert_eq!(sent[0].2["total"], "£11.98");
        assert_eq!(sent[0].2["firstName"], "Budi");
    }

    #[actix_web::test]
    async fn feedback_rating_must_be_one_to_five() {
        let state = AppState::in_memory(RecordingMailer::shared());

        let (status, _) = post(
            &state,
            "/api/feedback",
            json!({"rating": 6, "comment": "Too hot for me"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(
            &state,
            "/api/feedback",
            json!({"rating": 5, "comment": "Perfect on eggs", "orderNumber": "SB-1001"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.submissions.count(SubmissionKind::Feedback).await.unwrap(), 1);
    }
}
