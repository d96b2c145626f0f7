//! HTTP handlers and route configuration.

mod campaigns;
mod forms;
mod health;
mod products;

use std::sync::Arc;

use actix_web::web;
use serde_json::Value;

use sambal_core::domain::email::mask_email;
use sambal_core::domain::{EndpointClass, FormSubmission};
use sambal_core::error::RepoError;
use sambal_core::ports::{EmailSender, RateLimiter};
use sambal_infra::spawn_detached;
use sambal_shared::dto::SubmissionAccepted;

use crate::middleware::error::{AppError, json_error_handler};
use crate::middleware::rate_limit::RateLimit;
use crate::state::AppState;

/// Shared state, body limits and every route.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: AppState) {
    let limiter = state.limiter.clone();
    cfg.app_data(web::Data::new(state))
        .app_data(
            web::JsonConfig::default()
                .limit(64 * 1024)
                .error_handler(json_error_handler),
        )
        .configure(|cfg| configure_routes(cfg, &limiter));
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: &Arc<dyn RateLimiter>) {
    let limit = |class| RateLimit::new(limiter.clone(), class);

    cfg.service(
        web::scope("/api")
            // Public reads
            .route("/health", web::get().to(health::health_check))
            .route("/products", web::get().to(products::list_products))
            .route("/products/{slug}", web::get().to(products::get_product))
            // Forms
            .service(
                web::resource("/contact")
                    .wrap(limit(EndpointClass::Contact))
                    .route(web::post().to(forms::contact)),
            )
            .service(
                web::resource("/newsletter")
                    .wrap(limit(EndpointClass::Newsletter))
                    .route(web::post().to(forms::newsletter)),
            )
            .service(
                web::resource("/waitlist")
                    .wrap(limit(EndpointClass::Interest))
                    .route(web::post().to(forms::waitlist)),
            )
            .service(
                web::resource("/interest")
                    .wrap(limit(EndpointClass::Interest))
                    .route(web::post().to(forms::interest)),
            )
            .service(
                web::resource("/preorder")
                    .wrap(limit(EndpointClass::Preorder))
                    .route(web::post().to(forms::preorder)),
            )
            .service(
                web::resource("/feedback")
                    .wrap(limit(EndpointClass::Feedback))
                    .route(web::post().to(forms::feedback)),
            )
            // Campaign triggers
            .service(
                web::resource("/review-request")
                    .wrap(limit(EndpointClass::Default))
                    .route(web::post().to(campaigns::review_request)),
            )
            .service(
                web::resource("/abandoned-cart")
                    .wrap(limit(EndpointClass::Default))
                    .route(web::post().to(campaigns::abandoned_cart)),
            )
            .service(
                web::resource("/drip/subscribe")
                    .wrap(limit(EndpointClass::Newsletter))
                    .route(web::post().to(campaigns::drip_subscribe)),
            )
            .service(
                web::resource("/test/campaigns/{campaign}")
                    .wrap(limit(EndpointClass::Default))
                    .route(web::post().to(campaigns::test_trigger)),
            ),
    );
}

/// Send one email in the background; failures are logged, never surfaced.
fn send_detached(
    mailer: Arc<dyn EmailSender>,
    template_id: &'static str,
    recipient: String,
    payload: Value,
) {
    spawn_detached("email", async move {
        mailer
            .send_templated(template_id, &recipient, &payload)
            .await
            .map(|_| ())
            .map_err(|e| format!("{} to {}: {}", template_id, mask_email(&recipient), e))
    });
}

/// Outcome of a store write for endpoints that tolerate an unreachable store.
fn accepted_or_simulated(
    stored: Result<FormSubmission, RepoError>,
) -> Result<SubmissionAccepted, AppError> {
    match stored {
        Ok(submission) => Ok(SubmissionAccepted {
            id: Some(submission.id.to_string()),
            simulated: false,
        }),
        Err(e) if e.is_unavailable() => {
            tracing::warn!(error = %e, "Submission store unreachable, reporting success");
            Ok(SubmissionAccepted {
                id: None,
                simulated: true,
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use sambal_core::ports::{EmailSender, MailError, SendReceipt};
    use serde_json::Value;

    /// Records every send as `(template, recipient, payload)`.
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<(String, String, Value)>>,
    }

    impl RecordingMailer {
        pub fn shared() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn sent(&self) -> Vec<(String, String, Value)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn templates(&self) -> Vec<String> {
            self.sent().into_iter().map(|(t, _, _)| t).collect()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingMailer {
        async fn send_templated(
            &self,
            template_id: &str,
            recipient: &str,
            payload: &Value,
        ) -> Result<SendReceipt, MailError> {
            self.sent.lock().unwrap().push((
                template_id.to_string(),
                recipient.to_string(),
                payload.clone(),
            ));
            Ok(SendReceipt { message_id: None })
        }
    }

    /// Let detached sends run.
    pub async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}
